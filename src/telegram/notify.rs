//! Owner notifications about the WhatsApp connection.

use teloxide::prelude::*;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::whatsapp::ConnectionState;

/// Message for the owner when the connection comes up or goes down.
fn connection_notice(was_open: bool, state: ConnectionState) -> Option<&'static str> {
    match (was_open, state.is_open()) {
        (false, true) => Some("🟢 WhatsApp connected."),
        (true, false) => {
            Some("🔴 WhatsApp disconnected. Reconnecting; use /pairing if the session was logged out.")
        }
        _ => None,
    }
}

/// Messages the owner whenever the WhatsApp connection opens or drops.
///
/// Runs until every tracker handle is gone.
pub async fn watch_connection(bot: Bot, owner: ChatId, mut rx: watch::Receiver<ConnectionState>) {
    let mut was_open = rx.borrow_and_update().is_open();

    while rx.changed().await.is_ok() {
        let state = *rx.borrow_and_update();
        let Some(notice) = connection_notice(was_open, state) else {
            continue;
        };
        was_open = state.is_open();

        if let Err(e) = bot.send_message(owner, notice).await {
            warn!("Failed to notify owner about connection state: {}", e);
        }
    }

    debug!("Connection watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_on_open_and_drop() {
        assert!(connection_notice(false, ConnectionState::Open).is_some());
        assert!(connection_notice(true, ConnectionState::Closed).is_some());
        assert!(connection_notice(true, ConnectionState::Connecting).is_some());
    }

    #[test]
    fn test_no_notice_while_reconnecting() {
        assert_eq!(connection_notice(false, ConnectionState::Connecting), None);
        assert_eq!(connection_notice(false, ConnectionState::Closed), None);
        assert_eq!(connection_notice(true, ConnectionState::Open), None);
    }
}
