pub mod database;
pub mod telegram;
pub mod vision; // Gemini food analysis

pub use database::{local_day_bounds, Database};
pub use telegram::{ChatService, TelegramClient};
pub use vision::GeminiService;
