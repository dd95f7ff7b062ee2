//! Phone number extraction and addressing.
//!
//! Numbers are pulled out of free text (command arguments or uploaded
//! documents) and turned into WhatsApp addresses for lookups.

mod address;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub use address::{ADDRESS_SUFFIX, Address};

/// Minimum number of consecutive digits treated as a phone number.
pub const MIN_DIGITS: usize = 6;

// ASCII digits only; `\d` would also match other Unicode digit classes.
#[allow(clippy::expect_used)]
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[0-9]{{{MIN_DIGITS},}}")).expect("number pattern is valid")
});

/// Extracts every run of six or more digits from `text`, in order.
///
/// Duplicates are preserved; deduplication is the caller's job.
#[must_use]
pub fn extract_numbers(text: &str) -> Vec<String> {
    NUMBER_RE
        .find_iter(text)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Trims, drops empty entries and removes duplicates, keeping first occurrence.
#[must_use]
pub fn unique_numbers<S: AsRef<str>>(numbers: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(numbers.len());
    numbers
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(*n))
        .map(str::to_owned)
        .collect()
}

/// Masks a phone number for logging (shows last 4 digits).
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 4 {
        format!("***{}", &digits[digits.len() - 4..])
    } else {
        "****".to_owned()
    }
}
