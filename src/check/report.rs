//! Bio-check results and their text renderings.

use std::fmt::{self, Write as _};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A registered number with a visible bio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioEntry {
    pub number: String,
    pub bio: String,
    pub set_at: Option<DateTime<Utc>>,
}

/// Outcome of one bio-check run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Numbers handed to the check, duplicates included.
    pub total_input: usize,

    /// Distinct numbers after deduplication.
    pub unique_count: usize,

    /// Distinct numbers registered on WhatsApp.
    pub registered_count: usize,

    /// Registered numbers with a non-empty bio.
    pub with_bio: Vec<BioEntry>,

    /// Registered numbers whose bio is empty, private, or failed to load.
    pub no_bio: Vec<String>,

    /// Numbers not registered on WhatsApp.
    pub not_registered: Vec<String>,

    pub started_at: DateTime<Utc>,

    pub elapsed: Duration,
}

impl Report {
    /// Short completion message for the chat.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "✅ Done in {}\n\
             Unique numbers: {}\n\
             Registered: {}\n\
             With bio: {}\n\
             No bio / private: {}\n\
             Not registered: {}",
            format_elapsed(self.elapsed),
            self.unique_count,
            self.registered_count,
            self.with_bio.len(),
            self.no_bio.len(),
            self.not_registered.len(),
        )
    }

    /// Full plain-text report delivered as a document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(out, "BIO CHECK RESULT");
        let _ = writeln!(out, "Generated: {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Total input: {}", self.total_input);
        let _ = writeln!(out, "Unique: {}", self.unique_count);
        let _ = writeln!(out, "Registered: {}", self.registered_count);
        let _ = writeln!(out, "With bio: {}", self.with_bio.len());
        let _ = writeln!(out, "No bio / private: {}", self.no_bio.len());
        let _ = writeln!(out, "Not registered: {}", self.not_registered.len());

        let _ = writeln!(out, "\n=== WITH BIO ===");
        for entry in &self.with_bio {
            match entry.set_at {
                Some(set_at) => {
                    let _ = writeln!(
                        out,
                        "{} => {} (set {})",
                        entry.number,
                        single_line(&entry.bio),
                        set_at.format("%Y-%m-%d %H:%M UTC")
                    );
                }
                None => {
                    let _ = writeln!(out, "{} => {}", entry.number, single_line(&entry.bio));
                }
            }
        }

        let _ = writeln!(out, "\n=== NO BIO ===");
        for number in &self.no_bio {
            let _ = writeln!(out, "{number}");
        }

        let _ = writeln!(out, "\n=== NOT REGISTERED ===");
        for number in &self.not_registered {
            let _ = writeln!(out, "{number}");
        }

        out
    }
}

/// Live counters pushed to the progress sink during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub unique: usize,
    pub registered: usize,
    pub not_registered: usize,
    pub with_bio: usize,
    pub no_bio: usize,
    pub batch: usize,
    pub total_batches: usize,
}

impl ProgressSnapshot {
    /// Registered numbers whose bio has been fetched so far.
    #[must_use]
    pub const fn fetched(&self) -> usize {
        self.with_bio + self.no_bio
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🔄 Batch {}/{}", self.batch, self.total_batches)?;
        writeln!(f, "Registered: {}/{}", self.registered, self.unique)?;
        writeln!(f, "Checked: {}/{}", self.fetched(), self.registered)?;
        writeln!(f, "✅ With bio: {}", self.with_bio)?;
        writeln!(f, "🔒 No bio: {}", self.no_bio)?;
        write!(f, "❌ Not registered: {}", self.not_registered)
    }
}

/// Bios may contain newlines; keep one entry per line in the report.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}.{}s", secs, elapsed.subsec_millis() / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
