//! WhatsApp messaging client module.
//!
//! The bio-check workflow only depends on the [`MessagingClient`] trait. The
//! production implementation talks to an HTTP bridge process that owns the
//! actual WhatsApp session; the [`ConnectionMonitor`] keeps the shared
//! [`ConnectionTracker`] in sync with that bridge.

mod connection;
mod gateway;
mod monitor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::numbers::Address;

pub use connection::{ConnectionEvent, ConnectionState, ConnectionTracker};
pub use gateway::GatewayClient;
pub use monitor::{ConnectionMonitor, ConnectionSource, MonitorMessage};

/// Errors returned by messaging client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to WhatsApp bridge failed: {0}")]
    Request(String),

    #[error("WhatsApp bridge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response from WhatsApp bridge: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::InvalidResponse(err.to_string());
        }
        Self::Request(err.to_string())
    }
}

/// Registration answer for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistenceResult {
    pub address: Address,
    pub exists: bool,
}

/// About/bio text of a registered account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRecord {
    /// Bio text, if the account exposes one.
    pub text: Option<String>,

    /// When the bio was last changed, if known.
    pub set_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    /// Returns the bio text if it is present and not blank.
    #[must_use]
    pub fn bio(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Operations the bot needs from a WhatsApp client.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Current connection state. Must not block or touch the network.
    fn connection_state(&self) -> ConnectionState;

    /// Checks registration for every address in a single request.
    async fn check_exists(&self, addresses: &[Address])
    -> Result<Vec<ExistenceResult>, ClientError>;

    /// Fetches the about/bio text of one address.
    async fn fetch_status(&self, address: &Address) -> Result<StatusRecord, ClientError>;

    /// Requests a pairing code for linking the given phone number.
    async fn request_pairing_code(&self, phone: &str) -> Result<String, ClientError>;
}
