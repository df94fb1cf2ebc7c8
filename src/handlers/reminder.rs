use anyhow::Result;
use chrono::{Datelike, Timelike, Utc};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::Config;
use crate::services::{ChatService, Database};

const WATER_TEXT: &str = "🥤 Стакан воды! Утро — лучшее время начать.";
const STEPS_TEXT: &str = "🚶 Сколько шагов за день? Напиши число — запишу.";
const WEIGH_TEXT: &str = "⚖️ Воскресное взвешивание! Напиши свой вес, например: 79.4";

/// Scheduled reminders for bound group chats. The scheduler ticks every
/// minute in UTC; the match against the configured wall-clock times
/// happens in the configured timezone, so a timezone change needs no
/// cron rewrite.
pub struct ReminderService {
    db: Arc<Database>,
    chat: Arc<dyn ChatService>,
    scheduler: JobScheduler,
    config: Arc<Config>,
}

impl ReminderService {
    pub async fn new(
        db: Arc<Database>,
        chat: Arc<dyn ChatService>,
        config: Arc<Config>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            db,
            chat,
            scheduler,
            config,
        })
    }

    pub async fn start(&self) -> Result<()> {
        let db = Arc::clone(&self.db);
        let chat = Arc::clone(&self.chat);
        let config = Arc::clone(&self.config);

        // Fire at second 0 of every minute.
        let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
            let db = Arc::clone(&db);
            let chat = Arc::clone(&chat);
            let config = Arc::clone(&config);
            Box::pin(async move {
                if let Err(e) = tick(&db, chat.as_ref(), &config).await {
                    log::error!("❌ Reminder tick failed: {}", e);
                }
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        log::info!(
            "⏰ Reminders scheduled: water {:02}:{:02}, steps {:02}:{:02}, weigh-in {:?} {:02}:{:02} ({})",
            self.config.water_hour,
            self.config.water_min,
            self.config.steps_hour,
            self.config.steps_min,
            self.config.weigh_weekday,
            self.config.weigh_hour,
            self.config.weigh_min,
            self.config.tz
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

async fn tick(db: &Database, chat: &dyn ChatService, config: &Config) -> Result<()> {
    let now = Utc::now().with_timezone(&config.tz);
    let (hour, minute) = (now.hour(), now.minute());

    let mut due: Vec<&str> = Vec::new();
    if hour == config.water_hour && minute == config.water_min {
        due.push(WATER_TEXT);
    }
    if hour == config.steps_hour && minute == config.steps_min {
        due.push(STEPS_TEXT);
    }
    if now.weekday() == config.weigh_weekday
        && hour == config.weigh_hour
        && minute == config.weigh_min
    {
        due.push(WEIGH_TEXT);
    }

    if due.is_empty() {
        return Ok(());
    }

    let chats = db.bound_chats().await?;
    log::info!("🔔 Sending {} reminder(s) to {} chat(s)", due.len(), chats.len());

    for chat_id in chats {
        for text in &due {
            // One unreachable chat must not starve the rest.
            if let Err(e) = chat.send_message(chat_id, text).await {
                log::warn!("⚠️ Reminder to chat {} failed: {}", chat_id, e);
            }
        }
    }

    Ok(())
}
