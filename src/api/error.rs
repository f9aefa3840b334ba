//! Error types for upstream API fetches.
//!
//! Every failure carries an HTTP-style status via [`FetchError::status`], so a
//! `Result<Fetched, FetchError>` is the tagged `{data, status} | {error, status}`
//! outcome callers branch on.

use thiserror::Error;

/// Status reported when retries are exhausted or the failure has no HTTP status.
pub const GENERIC_FAILURE_STATUS: u16 = 500;

/// Status reported for cancelled requests (client closed request).
pub const CANCELLED_STATUS: u16 = 499;

/// Errors that can occur while fetching from the upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response body was not the JSON shape expected.
    #[error("invalid JSON from {url}: {reason}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Every configured attempt failed with a retryable error.
    #[error(
        "giving up on {url} after {attempts} attempt(s): {last}\n  Suggestion: The upstream API may be down or throttling; try again later"
    )]
    Exhausted {
        /// The URL being fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last: Box<FetchError>,
    },

    /// The caller cancelled the request.
    #[error("request to {url} cancelled")]
    Cancelled {
        /// The URL whose fetch was abandoned.
        url: String,
    },

    /// The base URL or path could not form a valid URL.
    #[error("invalid URL: {url}\n  Suggestion: Check the configured base_url")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// Builder message.
        reason: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Wraps the final failure once retries are used up.
    pub fn exhausted(url: impl Into<String>, attempts: u32, last: FetchError) -> Self {
        Self::Exhausted {
            url: url.into(),
            attempts,
            last: Box::new(last),
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// HTTP-style status describing this failure.
    ///
    /// Permanent HTTP failures keep their own status; exhaustion and local
    /// failures report [`GENERIC_FAILURE_STATUS`].
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::HttpStatus { status, .. } => *status,
            Self::Cancelled { .. } => CANCELLED_STATUS,
            Self::InvalidUrl { .. } => 400,
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::Decode { .. }
            | Self::Exhausted { .. }
            | Self::Client { .. } => GENERIC_FAILURE_STATUS,
        }
    }

    /// Returns true if the request was cancelled by the caller.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_keeps_status() {
        let err = FetchError::http_status("https://api.test/anime", 404);
        assert_eq!(err.status(), 404);
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn test_exhausted_reports_generic_status() {
        let last = FetchError::http_status("https://api.test/nonce", 503);
        let err = FetchError::exhausted("https://api.test/nonce", 4, last);
        assert_eq!(err.status(), GENERIC_FAILURE_STATUS);
        let msg = err.to_string();
        assert!(msg.contains("4 attempt(s)"), "{msg}");
        assert!(msg.contains("HTTP 503"), "{msg}");
        assert!(msg.contains("Suggestion"), "{msg}");
    }

    #[test]
    fn test_cancelled_status() {
        let err = FetchError::cancelled("https://api.test/genre");
        assert!(err.is_cancelled());
        assert_eq!(err.status(), CANCELLED_STATUS);
    }

    #[test]
    fn test_decode_and_timeout_are_generic() {
        assert_eq!(FetchError::decode("u", "eof").status(), 500);
        assert_eq!(FetchError::timeout("u").status(), 500);
    }
}
