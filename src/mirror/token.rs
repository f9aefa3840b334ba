//! Mirror token codec.
//!
//! Upstream mirror tokens are base64 text wrapping a small JSON object
//! `{"id": <int>, "i": <int>, "q": "<quality>"}`. Decoding accepts the
//! standard and URL-safe alphabets, with or without padding.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::QualityLabel;

/// Decoded contents of a mirror token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPayload {
    /// Upstream post id.
    pub id: i64,
    /// Mirror index within the post.
    pub i: i64,
    /// Quality label, e.g. `"720p"`.
    pub q: String,
}

impl MirrorPayload {
    /// Parsed quality label of this mirror.
    #[must_use]
    pub fn quality(&self) -> QualityLabel {
        QualityLabel::parse(&self.q)
    }
}

/// Errors decoding a mirror token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token text was empty.
    #[error("mirror token is empty")]
    Empty,

    /// Token is not valid base64 in any supported alphabet.
    #[error("mirror token is not base64: {reason}")]
    Base64 {
        /// Decoder message.
        reason: String,
    },

    /// Base64 payload is not the expected JSON object.
    #[error("mirror token payload is not valid JSON: {reason}")]
    Json {
        /// Parser message.
        reason: String,
    },
}

/// Decodes a mirror token into its payload.
///
/// # Errors
///
/// Returns [`TokenError`] if the token is empty, not base64, or not the
/// expected JSON object.
///
/// # Examples
///
/// ```
/// use animirror_core::mirror::{decode_token, encode_token, MirrorPayload};
///
/// let payload = MirrorPayload { id: 1, i: 2, q: "720p".to_string() };
/// let token = encode_token(&payload);
/// assert_eq!(decode_token(&token).unwrap(), payload);
/// ```
pub fn decode_token(token: &str) -> Result<MirrorPayload, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    let bytes = STANDARD
        .decode(token)
        .or_else(|_| STANDARD_NO_PAD.decode(token))
        .or_else(|_| URL_SAFE.decode(token))
        .or_else(|_| URL_SAFE_NO_PAD.decode(token))
        .map_err(|error| TokenError::Base64 {
            reason: error.to_string(),
        })?;

    serde_json::from_slice(&bytes).map_err(|error| TokenError::Json {
        reason: error.to_string(),
    })
}

/// Encodes a payload the way the upstream issues tokens (standard base64).
#[must_use]
pub fn encode_token(payload: &MirrorPayload) -> String {
    // Serializing two integers and a string cannot fail
    let json = serde_json::to_vec(payload).unwrap_or_default();
    STANDARD.encode(json)
}

/// Short, log-safe prefix of a token.
#[must_use]
pub(crate) fn token_preview(token: &str) -> String {
    const PREVIEW_CHARS: usize = 12;
    let mut preview: String = token.chars().take(PREVIEW_CHARS).collect();
    if token.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
