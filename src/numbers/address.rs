//! WhatsApp addresses derived from phone numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Domain suffix appended to a bare number to form a user address.
pub const ADDRESS_SUFFIX: &str = "@s.whatsapp.net";

/// A WhatsApp user address (`<number>@s.whatsapp.net`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Builds the address for a bare phone number.
    #[must_use]
    pub fn for_number(number: &str) -> Self {
        Self(format!("{}{ADDRESS_SUFFIX}", number.trim()))
    }

    /// Returns the bare number part of the address.
    #[must_use]
    pub fn number(&self) -> &str {
        self.0.strip_suffix(ADDRESS_SUFFIX).unwrap_or(&self.0)
    }

    /// Returns the full address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
