//! Error types for mirror resolution.
//!
//! This module defines structured errors for the nonce exchange and the
//! quality fallback chain, following the What/Why/Fix pattern used across the
//! project. Callers branch on [`ResolveError::reason`], never on message text.

use std::fmt;

use thiserror::Error;

use crate::api::FetchError;

/// Which upstream call of the nonce exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolStep {
    /// `GET /nonce`
    Nonce,
    /// `GET /get-iframe`
    Iframe,
}

impl fmt::Display for ProtocolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nonce => f.write_str("nonce"),
            Self::Iframe => f.write_str("iframe"),
        }
    }
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Nonce endpoint answered without a nonce.
    NoNonce,
    /// Iframe endpoint answered without a URL.
    NoIframe,
    /// An upstream call failed (HTTP status, network, exhaustion).
    Upstream,
    /// The caller cancelled the resolution.
    Cancelled,
    /// Every ranked mirror failed.
    NoMirrorAvailable,
    /// Malformed input (empty token, unknown mirror name).
    InvalidInput,
}

/// Errors that can occur while resolving a mirror to a playable URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The nonce response had no usable `data` field.
    #[error(
        "no nonce in upstream response\n  Suggestion: The upstream nonce service may be degraded; try again later"
    )]
    NoNonce,

    /// The iframe response had no usable `iframe` field.
    #[error("no iframe URL returned for mirror {token}\n  Suggestion: Try another mirror")]
    NoIframe {
        /// Log-safe token prefix.
        token: String,
    },

    /// An upstream call of the exchange failed.
    #[error("{step} request failed (HTTP {status}): {source}", status = .source.status())]
    Upstream {
        /// Which call failed.
        step: ProtocolStep,
        /// The fetch failure.
        #[source]
        source: FetchError,
    },

    /// The caller cancelled the resolution.
    #[error("mirror resolution cancelled")]
    Cancelled,

    /// No ranked mirror resolved.
    #[error(
        "player unavailable: none of {tried} mirror(s) could be resolved\n  Suggestion: Retry later or pick a mirror manually"
    )]
    NoMirrorAvailable {
        /// Number of mirrors attempted.
        tried: usize,
    },

    /// The input cannot be resolved at all.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong.
        reason: String,
    },
}

impl ResolveError {
    /// Wraps a fetch failure for `step`, folding cancellation into [`Self::Cancelled`].
    #[must_use]
    pub fn upstream(step: ProtocolStep, source: FetchError) -> Self {
        if source.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Upstream { step, source }
        }
    }

    /// Creates an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Failure category of this error.
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::NoNonce => FailureReason::NoNonce,
            Self::NoIframe { .. } => FailureReason::NoIframe,
            Self::Upstream { .. } => FailureReason::Upstream,
            Self::Cancelled => FailureReason::Cancelled,
            Self::NoMirrorAvailable { .. } => FailureReason::NoMirrorAvailable,
            Self::InvalidInput { .. } => FailureReason::InvalidInput,
        }
    }

    /// HTTP status of the underlying upstream failure, if any.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { source, .. } => Some(source.status()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_mapping() {
        assert_eq!(ResolveError::NoNonce.reason(), FailureReason::NoNonce);
        assert_eq!(
            ResolveError::NoIframe {
                token: "eyJ".to_string()
            }
            .reason(),
            FailureReason::NoIframe
        );
        assert_eq!(
            ResolveError::NoMirrorAvailable { tried: 2 }.reason(),
            FailureReason::NoMirrorAvailable
        );
    }

    #[test]
    fn test_upstream_keeps_step_and_status() {
        let err = ResolveError::upstream(
            ProtocolStep::Iframe,
            FetchError::http_status("https://api.test/get-iframe", 404),
        );
        assert_eq!(err.reason(), FailureReason::Upstream);
        assert_eq!(err.upstream_status(), Some(404));
        let msg = err.to_string();
        assert!(msg.starts_with("iframe request failed (HTTP 404)"), "{msg}");
    }

    #[test]
    fn test_upstream_cancellation_folds_into_cancelled() {
        let err = ResolveError::upstream(
            ProtocolStep::Nonce,
            FetchError::cancelled("https://api.test/nonce"),
        );
        assert_eq!(err.reason(), FailureReason::Cancelled);
    }

    #[test]
    fn test_no_mirror_message_is_user_facing() {
        let msg = ResolveError::NoMirrorAvailable { tried: 3 }.to_string();
        assert!(msg.starts_with("player unavailable"), "{msg}");
        assert!(msg.contains("3 mirror(s)"), "{msg}");
    }
}
