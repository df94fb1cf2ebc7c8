use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Transport seam: the handlers talk to the chat through this trait so
/// the core stays testable without Telegram.
#[async_trait::async_trait]
pub trait ChatService: Send + Sync {
    /// Send plain text, returning the sent message id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64>;

    /// Send text with an inline "fix this" button. The returned message
    /// id doubles as the correction reference for the stored meal.
    /// Default implementation degrades to plain text.
    async fn send_message_with_fix_button(&self, chat_id: i64, text: &str) -> Result<i64> {
        self.send_message(chat_id, text).await
    }

    async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>>;
}

// ---- Bot API wire types ----

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub reply_to_message: Option<Box<IncomingMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TgChat {
    pub fn is_group(&self) -> bool {
        self.kind == "group" || self.kind == "supergroup"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    pub data: Option<String>,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<serde_json::Value>,
}

/// Telegram Bot API client over plain HTTPS.
pub struct TelegramClient {
    token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!("Telegram API error ({}): {}", status, error_text);
        }

        let parsed: ApiResponse<T> = response.json().await?;
        if !parsed.ok {
            anyhow::bail!(
                "Telegram API rejected {}: {}",
                method,
                parsed.description.unwrap_or_default()
            );
        }
        parsed
            .result
            .ok_or_else(|| anyhow::anyhow!("Telegram API returned ok without a result"))
    }

    /// Long-poll for updates. The per-request timeout is padded past
    /// the long-poll window so the two never race.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });

        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(std::time::Duration::from_secs(timeout_secs + 10))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!("Telegram API error ({}): {}", status, error_text);
        }

        let parsed: ApiResponse<Vec<Update>> = response.json().await?;
        if !parsed.ok {
            anyhow::bail!(
                "getUpdates rejected: {}",
                parsed.description.unwrap_or_default()
            );
        }
        Ok(parsed.result.unwrap_or_default())
    }

    pub async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatService for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id,
                    text,
                    reply_markup: None,
                },
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn send_message_with_fix_button(&self, chat_id: i64, text: &str) -> Result<i64> {
        let markup = json!({
            "inline_keyboard": [[{ "text": "✏️ Исправить", "callback_data": "fix" }]]
        });
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id,
                    text,
                    reply_markup: Some(markup),
                },
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>> {
        let info: FileInfo = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let file_path = info
            .file_path
            .ok_or_else(|| anyhow::anyhow!("getFile returned no file_path"))?;

        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.token, file_path
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Photo download failed ({})", response.status());
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Log-only transport for tests and local runs without a bot token.
pub struct MockChatService {
    next_id: std::sync::atomic::AtomicI64,
}

impl MockChatService {
    pub fn new() -> Self {
        Self {
            next_id: std::sync::atomic::AtomicI64::new(1),
        }
    }
}

impl Default for MockChatService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatService for MockChatService {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        log::info!("📱 [mock] -> chat {}: {}", chat_id, text);
        Ok(self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst))
    }

    async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>> {
        log::info!("📥 [mock] download {}", file_id);
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_message_ids_are_distinct() {
        let mock = MockChatService::new();
        let first = mock.send_message(1, "a").await.unwrap();
        let second = mock.send_message_with_fix_button(1, "b").await.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_group_chat_kinds() {
        let group = TgChat {
            id: -100,
            kind: "supergroup".to_string(),
        };
        let private = TgChat {
            id: 5,
            kind: "private".to_string(),
        };
        assert!(group.is_group());
        assert!(!private.is_group());
    }
}
