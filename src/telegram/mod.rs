//! Telegram transport
//!
//! Long-polling Bot API client; delivers (user, caption, image bytes) pairs
//! and analyze triggers to the session controller.

mod client;
mod models;

pub use client::{TelegramClient, API_BASE_URL};
pub use models::{ApiResponse, Chat, File, Message, PhotoSize, Update, User};
