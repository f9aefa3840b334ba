//! Retry logic with a fixed backoff table for upstream API requests.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying fetch errors and determining retry behavior.
//!
//! # Overview
//!
//! When a fetch fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - network errors, timeouts, 5xx, unparseable bodies
//! - [`FailureType::RateLimited`] - HTTP 429 from the upstream
//! - [`FailureType::Permanent`] - other 4xx responses, invalid URLs
//!
//! Transient and rate-limited failures are retried using the same backoff
//! table (500ms, 1s, 2s, 4s by default). Permanent failures return at once.
//!
//! # Example
//!
//! ```
//! use animirror_core::api::{FetchError, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://api.example.com/nonce", 429);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::FetchError;

/// Default backoff table in milliseconds; its length is the attempt count.
pub const DEFAULT_BACKOFF_MS: [u64; 4] = [500, 1000, 2000, 4000];

/// Classification of fetch failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    Transient,

    /// Permanent failure that won't succeed regardless of retries.
    Permanent,

    /// Upstream rate limiting (HTTP 429).
    RateLimited,
}

impl FailureType {
    /// Returns true for failures worth another attempt.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the fetch after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the fetch.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Fixed-table retry policy.
///
/// Attempt `n` (1-indexed) that fails retryably waits `backoff[n - 1]` before
/// attempt `n + 1`. The table length is the total number of attempts, and no
/// delay is spent after the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&DEFAULT_BACKOFF_MS)
    }
}

impl RetryPolicy {
    /// Creates a policy from an explicit backoff table.
    ///
    /// An empty table is replaced by a single zero delay (one attempt, no retry).
    #[must_use]
    pub fn new(backoff: Vec<Duration>) -> Self {
        if backoff.is_empty() {
            return Self {
                backoff: vec![Duration::ZERO],
            };
        }
        Self { backoff }
    }

    /// Creates a policy from a table of millisecond delays.
    #[must_use]
    pub fn from_millis(backoff_ms: &[u64]) -> Self {
        Self::new(backoff_ms.iter().copied().map(Duration::from_millis).collect())
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(Vec::new())
    }

    /// Maximum number of attempts, including the first.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_attempts(&self) -> u32 {
        self.backoff.len() as u32
    }

    /// The configured backoff table.
    #[must_use]
    pub fn backoff(&self) -> &[Duration] {
        &self.backoff
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts()))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts() {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts()),
            };
        }

        let index = attempt.saturating_sub(1) as usize;
        let delay = self.backoff.get(index).copied().unwrap_or_default();

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a fetch error into a failure type for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | HTTP 429 | RateLimited |
/// | HTTP 408, 5xx | Transient |
/// | Other HTTP status | Permanent |
/// | Network, Timeout, Decode | Transient |
/// | InvalidUrl, Client, Cancelled | Permanent |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { status, .. } => classify_http_status(*status),
        FetchError::Network { .. } | FetchError::Timeout { .. } | FetchError::Decode { .. } => {
            FailureType::Transient
        }
        FetchError::Exhausted { .. }
        | FetchError::Cancelled { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::Client { .. } => FailureType::Permanent,
    }
}

#[allow(clippy::match_same_arms)]
fn classify_http_status(status: u16) -> FailureType {
    match status {
        408 => FailureType::Transient,   // Request Timeout
        429 => FailureType::RateLimited, // Too Many Requests
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}
