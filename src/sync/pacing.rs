//! Fixed-delay pacing between dependent upstream calls
//!
//! Keeps the aggregate call rate under a known-safe ceiling. This is a plain
//! sleep, not a token bucket.

use std::time::Duration;
use tracing::trace;

/// Suspends the caller for a fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    /// Create a pacer with the given delay
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Pacer that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the configured delay
    pub async fn pace(&self) {
        if self.delay.is_zero() {
            return;
        }
        trace!(delay_ms = self.delay.as_millis(), "Pacing");
        tokio::time::sleep(self.delay).await;
    }
}
