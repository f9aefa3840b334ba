//! Two-step nonce exchange resolving a mirror token to a player URL.
//!
//! 1. `GET {base}/nonce` must answer `{"data": "<nonce>"}`.
//! 2. `GET {base}/get-iframe?content=<token>&nonce=<nonce>` must answer
//!    `{"iframe": "<url>"}`.
//!
//! Both calls go through [`ApiClient::fetch_json`], so they are rate limited
//! and retried. A fresh nonce is fetched for every resolution.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::context::ResolveContext;

use super::{PlaybackResolver, PlaybackUrl, ProtocolStep, ResolveError, token_preview};

/// Upstream path of the nonce endpoint.
const NONCE_PATH: &str = "nonce";

/// Upstream path of the iframe endpoint.
const IFRAME_PATH: &str = "get-iframe";

/// Resolves mirror tokens through the upstream nonce exchange.
#[derive(Debug, Clone)]
pub struct MirrorResolver {
    client: ApiClient,
}

impl MirrorResolver {
    /// Creates a resolver issuing requests through `client`.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetches a fresh nonce.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Upstream`] if the call fails, [`ResolveError::NoNonce`]
    /// if the body has no non-empty string `data` field.
    pub async fn fetch_nonce(&self, ctx: &ResolveContext) -> Result<String, ResolveError> {
        let fetched = self
            .client
            .fetch_json(NONCE_PATH, &[], ctx)
            .await
            .map_err(|error| ResolveError::upstream(ProtocolStep::Nonce, error))?;

        non_empty_str(&fetched.data, "data").ok_or(ResolveError::NoNonce)
    }

    /// Exchanges `token` and `nonce` for a player URL.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Upstream`] if the call fails, [`ResolveError::NoIframe`]
    /// if the body has no non-empty string `iframe` field.
    pub async fn fetch_iframe(
        &self,
        token: &str,
        nonce: &str,
        ctx: &ResolveContext,
    ) -> Result<PlaybackUrl, ResolveError> {
        let fetched = self
            .client
            .fetch_json(IFRAME_PATH, &[("content", token), ("nonce", nonce)], ctx)
            .await
            .map_err(|error| ResolveError::upstream(ProtocolStep::Iframe, error))?;

        non_empty_str(&fetched.data, "iframe")
            .map(PlaybackUrl::new)
            .ok_or_else(|| ResolveError::NoIframe {
                token: token_preview(token),
            })
    }
}

#[async_trait]
impl PlaybackResolver for MirrorResolver {
    fn name(&self) -> &str {
        "nonce-exchange"
    }

    #[instrument(skip(self, token, ctx), fields(token = %token_preview(token)))]
    async fn resolve(
        &self,
        token: &str,
        ctx: &ResolveContext,
    ) -> Result<PlaybackUrl, ResolveError> {
        if token.trim().is_empty() {
            return Err(ResolveError::invalid_input("mirror token is empty"));
        }

        let nonce = self.fetch_nonce(ctx).await?;
        debug!("nonce acquired");

        let playback = self.fetch_iframe(token, &nonce, ctx).await?;
        debug!("iframe resolved");
        Ok(playback)
    }
}

/// Returns `field` verbatim if it is a string with non-whitespace content.
fn non_empty_str(data: &Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}
