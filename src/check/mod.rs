//! Bulk WhatsApp bio checking.
//!
//! [`BioChecker::check_bio`] takes raw numbers, verifies registration, fetches
//! bios in bounded batches and returns a [`Report`] with three disjoint
//! classes: with bio, no bio, not registered.

mod report;
mod workflow;

use thiserror::Error;

use crate::whatsapp::{ClientError, ConnectionState};

pub use report::{BioEntry, ProgressSnapshot, Report};
pub use workflow::BioChecker;

/// Reasons a bio check does not produce a report.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("WhatsApp is not connected (state: {0})")]
    NotReady(ConnectionState),

    #[error("No phone numbers to check")]
    EmptyInput,

    #[error("Registration check failed: {0}")]
    ExistenceQuery(#[source] ClientError),
}

impl CheckError {
    /// Message shown to the chat user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotReady(_) => "⚠️ WhatsApp is not connected yet. Contact the owner.".to_owned(),
            Self::EmptyInput => {
                "Send numbers after the command or reply to a .txt file.".to_owned()
            }
            Self::ExistenceQuery(_) => {
                "❌ Registration check failed. Please try again in a moment.".to_owned()
            }
        }
    }
}
