pub mod message_handler;
pub mod reminder;

pub use message_handler::MessageHandler;
pub use reminder::ReminderService;
