//! Minimum spacing between successive downloads.
//!
//! Documents are fetched one at a time from the same server, so a single
//! "last request" timestamp is all the state needed.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Default spacing between two requests.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Enforces a minimum interval between consecutive requests.
///
/// The first [`wait`](Pacer::wait) returns immediately. Each later call
/// sleeps until `min_interval` has passed since the previous one returned.
/// Time spent downloading counts towards the interval.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_INTERVAL)
    }
}

impl Pacer {
    /// `Duration::ZERO` disables pacing entirely.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next request slot.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                debug!(delay_ms = delay.as_millis(), "Pausing before next request");
                tokio::time::sleep(delay).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
