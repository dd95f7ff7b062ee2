//! Progress reporting for long-running checks.
//!
//! The workflow pushes rendered snapshots into a [`ProgressSink`]. The
//! [`ThrottledProgress`] sink adds the minimum-interval and duplicate
//! suppression rules on top of any [`ProgressTarget`], such as a chat message
//! that gets edited in place.

mod rate_limiter;
mod throttled;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use rate_limiter::RateLimiter;
pub use throttled::ThrottledProgress;

/// Receiver of progress snapshots.
#[async_trait]
pub trait ProgressSink: Send {
    /// Best-effort update. May be dropped silently.
    async fn push(&mut self, text: &str);

    /// Terminal update. Always attempted once; later calls are ignored.
    async fn finish(&mut self, text: &str);
}

/// Failure to display a snapshot.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Rate limited, retry after {0:?}")]
    RetryAfter(Duration),

    #[error("Failed to render progress: {0}")]
    Failed(String),
}

/// Something that can display a progress snapshot.
#[async_trait]
pub trait ProgressTarget: Send + Sync {
    async fn render(&self, text: &str) -> Result<(), RenderError>;
}
