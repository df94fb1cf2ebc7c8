use std::time::Duration;

use anyhow::Result;
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use crate::models::Goal;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

/// Gemini client for food analysis. The API key is optional: without
/// it the bot still runs, and the photo handler answers with a hint
/// instead of an analysis.
pub struct GeminiService {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Result<Self> {
        // Bounded timeout: the analysis call must never be left
        // pending indefinitely.
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Analyze a food photo. Returns the raw model reply; the caller
    /// extracts the calorie range and title from it.
    pub async fn analyze_food(
        &self,
        image: &[u8],
        mime_type: &str,
        goal: Goal,
        caption: Option<&str>,
    ) -> Result<String> {
        log::debug!("📸 Analyzing food photo ({} bytes, {})", image.len(), mime_type);

        let parts = vec![
            Part::Text {
                text: food_prompt(goal, caption),
            },
            Part::Inline {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: general_purpose::STANDARD.encode(image),
                },
            },
        ];

        self.generate(parts).await
    }

    /// Re-estimate a meal from a textual description. Backs both the
    /// correction flow and the caption fallback when the photo call
    /// fails.
    pub async fn analyze_text(&self, description: &str, goal: Goal) -> Result<String> {
        log::debug!("📝 Re-estimating meal from text: {}", description);

        let prompt = format!(
            "{}\n\nФото нет, есть только описание еды от пользователя:\n«{}»\n\nОцени по описанию.",
            food_prompt(goal, None),
            description
        );

        self.generate(vec![Part::Text { text: prompt }]).await
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => anyhow::bail!("GEMINI_API_KEY is not configured"),
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, api_key
        );

        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        log::info!("🤖 Sending request to Gemini ({})", self.model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            log::error!("❌ Gemini API error ({}): {}", status, error_text);
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            anyhow::bail!("Gemini returned an empty reply");
        }

        log::debug!("💬 Gemini reply: {} chars", text.len());
        Ok(text)
    }
}

fn food_prompt(goal: Goal, caption: Option<&str>) -> String {
    let strictness = match goal {
        Goal::Cut => "Будь строже: контролируй калории/сладкое/жирное, упор на белок и овощи.",
        Goal::Maintain => "Баланс: без жесткача, но по делу.",
        Goal::Bulk => "Упор на белок и достаточную калорийность; отмечай качество продуктов.",
    };

    let caption_note = match caption {
        Some(caption) if !caption.trim().is_empty() => {
            format!("\nПодпись к фото от пользователя: «{}».\n", caption.trim())
        }
        _ => String::new(),
    };

    format!(
        "Ты — помощник по питанию. Цель: {goal}. {strictness}\n\
         {caption_note}\n\
         По фото еды:\n\
         1) Определи блюдо (если не уверен — 2–3 варианта).\n\
         2) Оценка 1–10.\n\
         3) Калории ДИАПАЗОНОМ (примерно), формат: число-число.\n\
         4) Почему (1–2 предложения).\n\
         5) Один конкретный совет.\n\
         \n\
         Формат строго:\n\
         Блюдо:\n\
         Оценка:\n\
         Калории:\n\
         Почему:\n\
         Совет:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_strictness_follows_goal() {
        assert!(food_prompt(Goal::Cut, None).contains("строже"));
        assert!(food_prompt(Goal::Bulk, None).contains("белок и достаточную"));
        assert!(food_prompt(Goal::Maintain, None).contains("Баланс"));
    }

    #[test]
    fn test_prompt_keeps_reply_format() {
        let prompt = food_prompt(Goal::Maintain, Some("борщ"));
        assert!(prompt.contains("Блюдо:"));
        assert!(prompt.contains("Калории:"));
        assert!(prompt.contains("борщ"));
    }

    #[test]
    fn test_disabled_service() {
        let service =
            GeminiService::new(None, "gemini-2.5-flash".to_string(), Duration::from_secs(5))
                .unwrap();
        assert!(!service.is_enabled());
    }
}
