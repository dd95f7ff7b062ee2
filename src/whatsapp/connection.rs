//! Connection state tracking.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Lifecycle state of the WhatsApp connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
}

impl ConnectionState {
    /// Parses the state names the bridge reports.
    #[must_use]
    pub fn from_bridge(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "connecting" => Some(Self::Connecting),
            "close" | "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Applies a connection event and returns the resulting state.
    #[must_use]
    pub const fn next(self, event: ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Connecting => Self::Connecting,
            ConnectionEvent::Opened => Self::Open,
            ConnectionEvent::Closed { .. } => Self::Closed,
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Connecting => "connecting",
            Self::Open => "open",
        };
        f.write_str(name)
    }
}

/// Events that drive the connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connecting,
    Opened,
    /// The connection dropped. `logged_out` means the session is gone and a
    /// new pairing is needed before reconnecting makes sense.
    Closed { logged_out: bool },
}

impl ConnectionEvent {
    /// Whether a reconnect attempt should follow this event.
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(self, Self::Closed { logged_out: false })
    }
}

/// Shared, synchronously readable view of the connection state.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new(ConnectionState::Closed)
    }
}

impl ConnectionTracker {
    #[must_use]
    pub fn new(initial: ConnectionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Applies an event and returns the new state.
    pub fn apply(&self, event: ConnectionEvent) -> ConnectionState {
        let previous = self.current();
        let next = previous.next(event);
        self.tx.send_replace(next);

        if previous != next {
            match next {
                ConnectionState::Open => info!("WhatsApp connection open"),
                ConnectionState::Connecting => info!("WhatsApp connecting..."),
                ConnectionState::Closed => warn!("WhatsApp connection closed ({:?})", event),
            }
        }

        next
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}
