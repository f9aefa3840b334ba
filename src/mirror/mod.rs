//! Mirror resolution: from opaque mirror tokens to a playable URL.
//!
//! # Architecture
//!
//! - [`PlaybackResolver`] - async trait turning one mirror token into a URL
//! - [`MirrorResolver`] - the upstream two-step nonce exchange
//! - [`QualitySelector`] - ranks mirrors best-quality-first and walks the fallback chain
//! - [`decode_token`] / [`encode_token`] - mirror token codec
//! - [`QualityLabel`] - closed quality set with selection priority
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use animirror_core::ResolveContext;
//! use animirror_core::api::{ApiClient, ApiConfig};
//! use animirror_core::mirror::{MirrorResolver, QualitySelector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ApiConfig::default())?;
//! let ctx = ResolveContext::new();
//! let episode = client.episode("one-piece-sub-indo", "1", &ctx).await?;
//!
//! let selector = QualitySelector::new(Arc::new(MirrorResolver::new(client)));
//! let selected = selector.select(&episode.mirror, &ctx).await?;
//! println!("{} ({}) -> {}", selected.name, selected.quality, selected.url);
//! # Ok(())
//! # }
//! ```

mod error;
mod quality;
mod resolver;
mod selector;
mod token;

pub use error::{FailureReason, ProtocolStep, ResolveError};
pub use quality::{QualityLabel, UNKNOWN_QUALITY_PRIORITY};
pub use resolver::MirrorResolver;
pub use selector::{QualitySelector, RankedMirror, SelectedMirror};
pub use token::{MirrorPayload, TokenError, decode_token, encode_token};

pub(crate) use token::token_preview;

use std::fmt;

use async_trait::async_trait;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::ResolveContext;

/// One mirror as listed by the upstream episode endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorEntry {
    /// Display name of the host (e.g. "ondesu").
    pub nama: String,
    /// Opaque mirror token.
    pub content: String,
}

impl MirrorEntry {
    /// Creates a mirror entry.
    #[must_use]
    pub fn new(nama: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            nama: nama.into(),
            content: content.into(),
        }
    }
}

/// Mirrors grouped under one quality tier key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityTier {
    /// Tier key as served (e.g. "m720p" or "720p").
    pub quality: String,
    /// Mirrors in this tier, in upstream order.
    pub mirrors: Vec<MirrorEntry>,
}

/// Quality tier map preserving upstream document order.
///
/// (De)serializes as a JSON object `{tier: [mirror, ...]}`. A `null` value
/// deserializes to no tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorTiers(pub Vec<QualityTier>);

impl MirrorTiers {
    /// Builds tiers from `(tier, mirrors)` pairs, keeping their order.
    #[must_use]
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<MirrorEntry>)>,
        K: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(quality, mirrors)| QualityTier {
                    quality: quality.into(),
                    mirrors,
                })
                .collect(),
        )
    }

    /// Iterates tiers in upstream order.
    pub fn iter(&self) -> impl Iterator<Item = &QualityTier> {
        self.0.iter()
    }

    /// Total number of mirrors across every tier.
    #[must_use]
    pub fn mirror_count(&self) -> usize {
        self.0.iter().map(|tier| tier.mirrors.len()).sum()
    }

    /// Returns true if there is no mirror at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mirror_count() == 0
    }
}

impl Serialize for MirrorTiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for tier in &self.0 {
            map.serialize_entry(&tier.quality, &tier.mirrors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MirrorTiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TiersVisitor;

        impl<'de> Visitor<'de> for TiersVisitor {
            type Value = MirrorTiers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of quality tier to mirror list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MirrorTiers, A::Error> {
                let mut tiers = Vec::new();
                while let Some((quality, mirrors)) = map.next_entry::<String, Vec<MirrorEntry>>()? {
                    tiers.push(QualityTier { quality, mirrors });
                }
                Ok(MirrorTiers(tiers))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<MirrorTiers, E> {
                Ok(MirrorTiers::default())
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<MirrorTiers, E> {
                Ok(MirrorTiers::default())
            }
        }

        deserializer.deserialize_any(TiersVisitor)
    }
}

/// A resolved, ephemeral playback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackUrl {
    /// The iframe/player URL.
    pub url: String,
}

impl PlaybackUrl {
    /// Creates a playback URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Turns one mirror token into a playable URL.
///
/// # Object Safety
///
/// Uses `async_trait` so the selector can hold `Arc<dyn PlaybackResolver>`.
#[async_trait]
pub trait PlaybackResolver: Send + Sync {
    /// Resolver name for logging.
    fn name(&self) -> &str;

    /// Resolves `token` to a playback URL.
    async fn resolve(&self, token: &str, ctx: &ResolveContext)
    -> Result<PlaybackUrl, ResolveError>;
}
