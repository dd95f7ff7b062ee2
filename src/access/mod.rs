//! Access control for bot commands.
//!
//! The owner is configured statically; premium users live in a small JSON
//! allowlist that owner commands edit at runtime.

mod audit;
mod store;

pub use audit::{AuditIssue, audit_ids};
pub use store::{ACCESS_FILE_NAME, AccessError, AccessList, AccessStore};

/// Access level a command requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Anyone may run the command.
    Public,
    /// Only the configured owner.
    Owner,
    /// The owner or any allowlisted user.
    Premium,
}

/// Decides whether a user may run commands of a given level.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    owner_id: i64,
    store: AccessStore,
}

impl AccessPolicy {
    #[must_use]
    pub const fn new(owner_id: i64, store: AccessStore) -> Self {
        Self { owner_id, store }
    }

    #[must_use]
    pub const fn store(&self) -> &AccessStore {
        &self.store
    }

    /// Returns `true` if `user_id` is the configured owner.
    ///
    /// An owner id of `0` means no owner is configured.
    #[must_use]
    pub const fn is_owner(&self, user_id: i64) -> bool {
        self.owner_id != 0 && user_id == self.owner_id
    }

    /// Returns `true` if `user_id` is the owner or on the allowlist.
    #[must_use]
    pub fn is_premium(&self, user_id: i64) -> bool {
        self.is_owner(user_id) || self.store.load().contains(user_id)
    }

    #[must_use]
    pub fn allows(&self, user_id: i64, level: AccessLevel) -> bool {
        match level {
            AccessLevel::Public => true,
            AccessLevel::Owner => self.is_owner(user_id),
            AccessLevel::Premium => self.is_premium(user_id),
        }
    }
}
