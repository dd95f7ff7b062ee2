//! WhatsApp connection monitor.
//!
//! The monitor follows a simple loop:
//! 1. Poll the bridge for its connection state
//! 2. Feed the result into the shared tracker
//! 3. If the connection closed without a logout, wait and ask for a reconnect
//! 4. If the session was logged out, stop reconnecting until it opens again
//!
//! An unreachable bridge counts as a closed connection so that checks fail
//! fast with "not ready" instead of hanging on requests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};
use tracing::{error, info, warn};

use super::{ClientError, ConnectionEvent, ConnectionState, ConnectionTracker};

/// Where the monitor reads connection state from.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    /// Reads the current connection state as an event.
    async fn poll(&self) -> Result<ConnectionEvent, ClientError>;

    /// Asks for a fresh connection attempt.
    async fn reconnect(&self) -> Result<(), ClientError>;
}

/// Messages that can be sent to the monitor.
#[derive(Debug, Clone)]
pub enum MonitorMessage {
    /// Stop the monitor.
    Shutdown,
}

/// Keeps the connection tracker in sync and drives reconnects.
pub struct ConnectionMonitor {
    source: Arc<dyn ConnectionSource>,
    tracker: ConnectionTracker,
    poll_interval: Duration,
    reconnect_delay: Duration,
    logged_out: bool,
}

impl ConnectionMonitor {
    #[must_use]
    pub fn new(source: Arc<dyn ConnectionSource>, tracker: ConnectionTracker) -> Self {
        Self {
            source,
            tracker,
            poll_interval: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(5),
            logged_out: false,
        }
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Runs the monitor loop until shut down.
    pub async fn run(mut self, mut rx: mpsc::Receiver<MonitorMessage>) {
        info!(
            "Connection monitor started (poll every {:?})",
            self.poll_interval
        );

        let mut poll_timer = interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = poll_timer.tick() => {
                    if self.tick().await {
                        tokio::select! {
                            () = self.reconnect() => {}
                            _ = rx.recv() => {
                                info!("Connection monitor shutting down during reconnect");
                                break;
                            }
                        }
                    }
                }
                msg = rx.recv() => {
                    match msg {
                        Some(MonitorMessage::Shutdown) | None => {
                            info!("Connection monitor shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Single poll of the connection state. Returns `true` if a reconnect should follow.
    async fn tick(&mut self) -> bool {
        let event = match self.source.poll().await {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to poll WhatsApp bridge: {}", e);
                self.tracker.apply(ConnectionEvent::Closed { logged_out: false });
                return false;
            }
        };

        let state = self.tracker.apply(event);
        if state == ConnectionState::Open {
            self.logged_out = false;
        }

        if let ConnectionEvent::Closed { logged_out: true } = event {
            if !self.logged_out {
                error!("WhatsApp session logged out. Pair again with /pairing.");
                self.logged_out = true;
            }
            return false;
        }

        event.should_reconnect()
    }

    async fn reconnect(&self) {
        warn!("Reconnecting to WhatsApp in {:?}", self.reconnect_delay);
        sleep(self.reconnect_delay).await;

        match self.source.reconnect().await {
            Ok(()) => {
                self.tracker.apply(ConnectionEvent::Connecting);
            }
            Err(e) => {
                error!("Reconnect request failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for ConnectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionMonitor")
            .field("poll_interval", &self.poll_interval)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("logged_out", &self.logged_out)
            .finish_non_exhaustive()
    }
}
