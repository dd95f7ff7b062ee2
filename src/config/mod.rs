//! Configuration module for the bio check bot.
//!
//! Everything is read from environment variables (optionally loaded from a
//! `.env` file), with defaults for all but the bot token.

mod settings;

pub use settings::{BotSettings, CheckSettings, ConfigError, TelegramConfig, WhatsAppConfig};
