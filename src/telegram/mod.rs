//! Telegram Bot API transport.
//!
//! Long-polls updates with `teloxide`, routes commands through the
//! [`CommandHandler`](crate::commands::CommandHandler) and drives bio checks
//! with a status message that is edited as progress arrives.

mod bot;
mod input;
mod notify;
mod progress;

use thiserror::Error;

pub use bot::{AppState, REPORT_FILE_NAME, handle_message, run_polling};
pub use notify::watch_connection;
pub use progress::MessageEditTarget;

/// Errors that can occur in the Telegram transport.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Download failed: {0}")]
    Download(#[from] teloxide::DownloadError),

    #[error("not a text file ({0})")]
    UnsupportedDocument(String),

    #[error("file is too large ({size} bytes, limit {limit})")]
    DocumentTooLarge { size: u32, limit: u32 },
}
