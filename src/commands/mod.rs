//! Command handling module.
//!
//! Parses slash commands from message text or document captions, checks the
//! sender's access level and runs everything except the bio check itself,
//! which the transport drives because it needs documents and a progress
//! message.

mod handler;
mod types;

pub use handler::{CommandHandler, Dispatch, Sender};
pub use types::{BotCommand, CommandResult};
