//! Polling primitives
//!
//! Searches in the application under test poll until a deadline. The pause
//! between polls parks the thread, so another thread may cut it short with
//! [`std::thread::Thread::unpark`]. An early wake-up is logged and otherwise
//! ignored: only the deadline ends a search.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default pause between two polls (1 second)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default search timeout (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Deadline used when `now + timeout` does not fit in an [`Instant`]
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Options of a polling search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptions {
    /// Search timeout in whole seconds
    pub timeout_secs: u64,
    /// Pause between polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in seconds
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set poll interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_secs.saturating_mul(1000))
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Deadline for a search starting now
    #[must_use]
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.timeout())
    }
}

/// Absolute point in time after which a search is abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            at: now
                .checked_add(timeout)
                .or_else(|| now.checked_add(FAR_FUTURE))
                .unwrap_or(now),
        }
    }

    /// Whether the deadline has not been reached yet
    #[must_use]
    pub fn is_pending(&self) -> bool {
        Instant::now() < self.at
    }

    /// Time left before the deadline
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

/// Outcome of a [`pause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// Slept the whole interval
    Elapsed,
    /// Woken before the interval was over
    Interrupted,
}

/// Park the current thread for `interval`.
///
/// An early wake-up is reported as [`PauseOutcome::Interrupted`] and logged;
/// callers are expected to carry on with their loop.
pub fn pause(interval: Duration) -> PauseOutcome {
    let start = Instant::now();
    std::thread::park_timeout(interval);
    if start.elapsed() < interval {
        tracing::warn!(
            slept_ms = start.elapsed().as_millis() as u64,
            "search pause interrupted, resuming"
        );
        PauseOutcome::Interrupted
    } else {
        PauseOutcome::Elapsed
    }
}
