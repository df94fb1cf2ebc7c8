mod config;
mod handlers;
mod metrics;
mod models;
mod parsing;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenv::dotenv;

use config::Config;
use handlers::{MessageHandler, ReminderService};
use services::telegram::Update;
use services::{ChatService, Database, GeminiService, TelegramClient};

const LONG_POLL_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("🚀 Starting food bot...");

    let config = Arc::new(Config::from_env()?);

    let db = Arc::new(Database::new(&config.database_url).await?);
    log::info!("✅ Database ready");

    let vision = Arc::new(GeminiService::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.analysis_timeout_secs),
    )?);
    if vision.is_enabled() {
        log::info!("✅ Gemini analysis enabled ({})", config.gemini_model);
    } else {
        log::warn!("⚠️ GEMINI_API_KEY not set, photo analysis disabled");
    }

    let telegram = Arc::new(TelegramClient::new(config.bot_token.clone()));
    let chat: Arc<dyn ChatService> = telegram.clone();

    let handler = Arc::new(MessageHandler::new(
        Arc::clone(&db),
        vision,
        Arc::clone(&chat),
        Arc::clone(&config),
    ));

    let mut reminders = ReminderService::new(db, chat, Arc::clone(&config)).await?;
    reminders.start().await?;

    tokio::select! {
        _ = poll_updates(Arc::clone(&telegram), handler) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("🛑 Shutting down...");
        }
    }

    reminders.stop().await?;
    Ok(())
}

async fn poll_updates(telegram: Arc<TelegramClient>, handler: Arc<MessageHandler>) {
    let mut offset = 0i64;

    loop {
        match telegram.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);

                    let telegram = Arc::clone(&telegram);
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = dispatch_update(&telegram, &handler, update).await {
                            log::error!("❌ Update handling failed: {}", e);
                        }
                    });
                }
            }
            Err(e) => {
                log::error!("❌ getUpdates failed: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn dispatch_update(
    telegram: &TelegramClient,
    handler: &MessageHandler,
    update: Update,
) -> Result<()> {
    if let Some(callback) = update.callback_query {
        if callback.data.as_deref() == Some("fix") {
            if let Some(message) = &callback.message {
                log::info!("✏️ fix button pressed by {}", callback.from.first_name);
                handler
                    .handle_fix_button(message.chat.id, callback.from.id, message.message_id)
                    .await?;
            }
        }
        // Always ack, or the client keeps its spinner.
        telegram.answer_callback(&callback.id).await?;
        return Ok(());
    }

    let Some(message) = update.message else {
        return Ok(());
    };
    let Some(from) = &message.from else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    let chat_id = message.chat.id;
    let user_id = from.id;

    if let Some(photos) = &message.photo {
        if let Some(photo) = photos.iter().max_by_key(|p| p.width * p.height) {
            handler
                .handle_photo(chat_id, user_id, &photo.file_id, message.caption.as_deref())
                .await?;
        }
        return Ok(());
    }

    if let Some(text) = &message.text {
        // A correction must reply to one of our own messages.
        let reply_to_bot_message = message.reply_to_message.as_ref().and_then(|replied| {
            replied
                .from
                .as_ref()
                .filter(|u| u.is_bot)
                .map(|_| replied.message_id)
        });

        handler
            .handle_text(
                chat_id,
                user_id,
                text,
                message.chat.is_group(),
                reply_to_bot_message,
            )
            .await?;
    }

    Ok(())
}
