//! Application settings loaded from the environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Telegram bot configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    pub bot_token: String,

    /// Telegram user id of the owner. `0` disables owner commands.
    #[serde(default)]
    pub owner_id: i64,

    /// Largest document the bot downloads for number extraction.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u32,
}

fn default_max_document_bytes() -> u32 {
    10 * 1024 * 1024
}

impl TelegramConfig {
    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` to be set; `OWNER_ID` and `MAX_DOCUMENT_BYTES` are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or the owner id is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("BOT_TOKEN")
            .ok()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let owner_id = match std::env::var("OWNER_ID") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOwnerId(raw.clone()))?,
            _ => 0,
        };

        Ok(Self {
            bot_token,
            owner_id,
            max_document_bytes: env_or("MAX_DOCUMENT_BYTES", default_max_document_bytes()),
        })
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("owner_id", &self.owner_id)
            .field("max_document_bytes", &self.max_document_bytes)
            .finish()
    }
}

/// WhatsApp bridge connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Base URL of the WhatsApp HTTP bridge.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Session name the bridge stores credentials under.
    #[serde(default = "default_session_name")]
    pub session_name: String,

    /// How often the connection state is polled, in seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,

    /// Delay before asking the bridge to reconnect, in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// Timeout for a single bridge request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:3000".to_owned()
}

fn default_session_name() -> String {
    "session".to_owned()
}

fn default_poll_secs() -> u64 {
    5
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            session_name: default_session_name(),
            poll_interval_secs: default_poll_secs(),
            reconnect_delay_secs: default_reconnect_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl WhatsAppConfig {
    /// Creates bridge settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            gateway_url: env_or("WA_GATEWAY_URL", default_gateway_url()),
            session_name: env_or("SESSION_NAME", default_session_name()),
            poll_interval_secs: env_or("WA_POLL_SECS", default_poll_secs()).max(1),
            reconnect_delay_secs: env_or("WA_RECONNECT_DELAY_SECS", default_reconnect_delay()),
            request_timeout_secs: env_or("WA_CONNECT_TIMEOUT_SECS", default_request_timeout())
                .max(1),
        }
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Tuning for the bio-check workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSettings {
    /// Concurrent bio fetches per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after each batch, in milliseconds.
    #[serde(default = "default_batch_pause")]
    pub batch_pause_ms: u64,

    /// Minimum spacing between progress message edits, in milliseconds.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

fn default_batch_size() -> usize {
    15
}

fn default_batch_pause() -> u64 {
    50
}

fn default_progress_interval() -> u64 {
    2000
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause(),
            progress_interval_ms: default_progress_interval(),
        }
    }
}

impl CheckSettings {
    /// Creates workflow settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            batch_size: env_or("BIO_BATCH_SIZE", default_batch_size()).max(1),
            batch_pause_ms: env_or("BIO_BATCH_PAUSE_MS", default_batch_pause()),
            progress_interval_ms: env_or("PROGRESS_MIN_INTERVAL_MS", default_progress_interval()),
        }
    }

    #[must_use]
    pub const fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Bot-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Directory holding the allowlist and temporary report files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub check: CheckSettings,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            check: CheckSettings::default(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR")
                .ok()
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty())
                .map_or_else(default_data_dir, PathBuf::from),
            check: CheckSettings::from_env_with_defaults(),
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid OWNER_ID '{0}' (must be a Telegram user id)")]
    InvalidOwnerId(String),
}
