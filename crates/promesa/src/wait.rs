//! Bounded polling for eventually-consistent UI state.
//!
//! Every wait in the suite goes through [`poll_until`] (or its async
//! sibling): a loop with a wall-clock deadline and a fixed sleep interval
//! that returns success/timeout as a value instead of hanging. Callers
//! that want a hard failure bridge through [`PollOutcome::into_result`].

use crate::result::{PromesaError, PromesaResult};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default deadline for poll operations (5 seconds)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Options for poll operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Wall-clock deadline in milliseconds
    pub timeout_ms: u64,
    /// Sleep between checks in milliseconds
    pub interval_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval in milliseconds
    #[must_use]
    pub const fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Deadline as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interval as a [`Duration`]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Result of a poll: the condition held, or the deadline expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition became true
    Satisfied {
        /// Time spent polling
        elapsed_ms: u64,
        /// Number of predicate evaluations
        attempts: u32,
    },
    /// The deadline expired with the condition still false
    TimedOut {
        /// Time spent polling
        elapsed_ms: u64,
        /// Number of predicate evaluations
        attempts: u32,
    },
}

impl PollOutcome {
    /// Whether the condition held before the deadline
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    /// Number of predicate evaluations performed
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Satisfied { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Time spent polling, in milliseconds
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Satisfied { elapsed_ms, .. } | Self::TimedOut { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// Convert a timeout into [`PromesaError::Timeout`] for callers that
    /// treat it as a test failure.
    ///
    /// # Errors
    ///
    /// Returns `PromesaError::Timeout` when the poll timed out.
    pub const fn into_result(self) -> PromesaResult<()> {
        match self {
            Self::Satisfied { .. } => Ok(()),
            Self::TimedOut { elapsed_ms, .. } => Err(PromesaError::Timeout { ms: elapsed_ms }),
        }
    }
}

/// Poll a synchronous predicate until it holds or the deadline expires.
///
/// The predicate is always evaluated at least once, so a zero timeout
/// still observes an already-true condition.
pub async fn poll_until<F>(mut predicate: F, options: &PollOptions) -> PollOutcome
where
    F: FnMut() -> bool,
{
    poll_until_async(|| std::future::ready(predicate()), options).await
}

/// Poll an asynchronous predicate until it holds or the deadline expires.
pub async fn poll_until_async<F, Fut>(mut predicate: F, options: &PollOptions) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if predicate().await {
            return PollOutcome::Satisfied {
                elapsed_ms: start.elapsed().as_millis() as u64,
                attempts,
            };
        }

        if start.elapsed() >= options.timeout() {
            return PollOutcome::TimedOut {
                elapsed_ms: start.elapsed().as_millis() as u64,
                attempts,
            };
        }

        tokio::time::sleep(options.interval()).await;
    }
}
