//! Best-quality-first fallback across redundant mirrors.
//!
//! Mirrors from every tier are flattened in upstream order, each labeled with
//! the quality decoded from its token (or its tier key when the token does not
//! decode or carries a blank label), then stably sorted by [`QualityLabel::priority`]. The chain is
//! walked sequentially; the first mirror that resolves wins.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::context::ResolveContext;

use super::{
    FailureReason, MirrorTiers, PlaybackResolver, QualityLabel, ResolveError, decode_token,
    token_preview,
};

/// A mirror with its effective quality, ready for the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMirror {
    /// Display name.
    pub name: String,
    /// Opaque mirror token.
    pub token: String,
    /// Quality decoded from the token, else parsed from the tier key.
    pub quality: QualityLabel,
    /// Tier key the mirror was listed under.
    pub tier: String,
}

impl RankedMirror {
    /// Selection priority; lower is tried first.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.quality.priority()
    }
}

/// The mirror that resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMirror {
    /// Playable URL.
    pub url: String,
    /// Display name of the winning mirror.
    pub name: String,
    /// Its effective quality.
    pub quality: QualityLabel,
}

/// Walks ranked mirrors until one resolves.
pub struct QualitySelector {
    resolver: Arc<dyn PlaybackResolver>,
}

impl QualitySelector {
    /// Creates a selector resolving mirrors through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn PlaybackResolver>) -> Self {
        Self { resolver }
    }

    /// Flattens and orders mirrors best quality first.
    ///
    /// The sort is stable: equal priorities keep upstream order.
    #[must_use]
    pub fn rank(tiers: &MirrorTiers) -> Vec<RankedMirror> {
        let mut ranked: Vec<RankedMirror> = tiers
            .iter()
            .flat_map(|tier| {
                tier.mirrors.iter().map(move |mirror| {
                    // A blank label in the token counts as no label at all
                    let quality = decode_token(&mirror.content)
                        .ok()
                        .filter(|payload| !payload.q.trim().is_empty())
                        .map_or_else(
                            || QualityLabel::parse(&tier.quality),
                            |payload| payload.quality(),
                        );
                    RankedMirror {
                        name: mirror.nama.clone(),
                        token: mirror.content.clone(),
                        quality,
                        tier: tier.quality.clone(),
                    }
                })
            })
            .collect();
        ranked.sort_by_key(RankedMirror::priority);
        ranked
    }

    /// Resolves the best available mirror.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NoMirrorAvailable`] when every mirror failed (or there were none)
    /// - [`ResolveError::Cancelled`] when `ctx` is cancelled mid-chain
    #[instrument(skip(self, tiers, ctx), fields(mirrors = tiers.mirror_count()))]
    pub async fn select(
        &self,
        tiers: &MirrorTiers,
        ctx: &ResolveContext,
    ) -> Result<SelectedMirror, ResolveError> {
        let ranked = Self::rank(tiers);
        self.walk(&ranked, ctx).await
    }

    /// Resolves only the mirror named `name` (manual pick).
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidInput`] if no mirror has that name; otherwise
    /// whatever the resolver returns for it.
    #[instrument(skip(self, tiers, ctx))]
    pub async fn select_named(
        &self,
        tiers: &MirrorTiers,
        name: &str,
        ctx: &ResolveContext,
    ) -> Result<SelectedMirror, ResolveError> {
        let mirror = Self::rank(tiers)
            .into_iter()
            .find(|mirror| mirror.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ResolveError::invalid_input(format!("no mirror named '{name}'")))?;

        let playback = self.resolver.resolve(&mirror.token, ctx).await?;
        info!(mirror = %mirror.name, quality = %mirror.quality, "mirror resolved");
        Ok(SelectedMirror {
            url: playback.url,
            name: mirror.name,
            quality: mirror.quality,
        })
    }

    async fn walk(
        &self,
        ranked: &[RankedMirror],
        ctx: &ResolveContext,
    ) -> Result<SelectedMirror, ResolveError> {
        let mut tried: usize = 0;

        for mirror in ranked {
            if ctx.is_cancelled() {
                debug!(tried, "mirror selection cancelled");
                return Err(ResolveError::Cancelled);
            }

            tried += 1;
            debug!(
                resolver = self.resolver.name(),
                mirror = %mirror.name,
                quality = %mirror.quality,
                "trying mirror"
            );

            match self.resolver.resolve(&mirror.token, ctx).await {
                Ok(playback) => {
                    info!(mirror = %mirror.name, quality = %mirror.quality, tried, "mirror resolved");
                    return Ok(SelectedMirror {
                        url: playback.url,
                        name: mirror.name.clone(),
                        quality: mirror.quality.clone(),
                    });
                }
                Err(error) if error.reason() == FailureReason::Cancelled => {
                    return Err(error);
                }
                Err(error) => {
                    warn!(
                        mirror = %mirror.name,
                        token = %token_preview(&mirror.token),
                        reason = ?error.reason(),
                        error = %error,
                        "mirror failed, trying next"
                    );
                }
            }
        }

        Err(ResolveError::NoMirrorAvailable { tried })
    }
}

impl fmt::Debug for QualitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualitySelector")
            .field("resolver", &self.resolver.name())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::mirror::{MirrorEntry, MirrorPayload, PlaybackUrl, encode_token};

    /// Records every token it sees; tokens in `failing` fail with `NoIframe`.
    struct ScriptedResolver {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
        cancel_after_first: Option<ResolveContext>,
    }

    impl ScriptedResolver {
        fn new<S: AsRef<str>>(failing: &[S]) -> Self {
            Self {
                failing: failing.iter().map(|t| t.as_ref().to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                cancel_after_first: None,
            }
        }

        fn succeeding() -> Self {
            Self::new::<&str>(&[])
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlaybackResolver for ScriptedResolver {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn resolve(
            &self,
            token: &str,
            _ctx: &ResolveContext,
        ) -> Result<PlaybackUrl, ResolveError> {
            self.calls.lock().unwrap().push(token.to_string());
            if let Some(ctx) = &self.cancel_after_first {
                ctx.cancel();
            }
            if self.failing.contains(token) {
                Err(ResolveError::NoIframe {
                    token: token.to_string(),
                })
            } else {
                Ok(PlaybackUrl::new(format!("https://player.test/{token}")))
            }
        }
    }

    fn token(q: &str, i: i64) -> String {
        encode_token(&MirrorPayload {
            id: 100,
            i,
            q: q.to_string(),
        })
    }

    #[test]
    fn test_rank_orders_by_decoded_quality() {
        let (t480, t1080, t720) = (token("480p", 0), token("1080p", 1), token("720p", 2));
        let tiers = MirrorTiers::from_pairs([
            ("m480p", vec![MirrorEntry::new("A", &t480)]),
            ("m1080p", vec![MirrorEntry::new("B", &t1080)]),
            ("m720p", vec![MirrorEntry::new("C", &t720)]),
        ]);

        let ranked = QualitySelector::rank(&tiers);
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["B", "C", "A"]);
    }

    #[test]
    fn test_rank_prefers_token_quality_over_tier_key() {
        // Listed under 360p, token says 1080p
        let tiers = MirrorTiers::from_pairs([
            ("360p", vec![MirrorEntry::new("low", token("360p", 0))]),
            ("360p-alt", vec![MirrorEntry::new("mislabeled", token("1080p", 1))]),
        ]);
        let ranked = QualitySelector::rank(&tiers);
        assert_eq!(ranked[0].name, "mislabeled");
        assert_eq!(ranked[0].quality, QualityLabel::P1080);
        assert_eq!(ranked[0].tier, "360p-alt");
    }

    #[test]
    fn test_rank_falls_back_to_tier_key_and_is_stable() {
        let tiers = MirrorTiers::from_pairs([
            ("weird", vec![MirrorEntry::new("u1", "@@not-a-token@@")]),
            (
                "720p",
                vec![
                    MirrorEntry::new("x1", "opaque-1"),
                    MirrorEntry::new("x2", "opaque-2"),
                ],
            ),
            ("weird2", vec![MirrorEntry::new("u2", "@@also-not@@")]),
        ]);
        let ranked = QualitySelector::rank(&tiers);
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["x1", "x2", "u1", "u2"]);
        assert_eq!(ranked[2].quality, QualityLabel::Other("weird".to_string()));
    }

    #[test]
    fn test_rank_blank_token_label_uses_tier_key() {
        let blank = token("", 0);
        let t720 = token("720p", 1);
        let tiers = MirrorTiers::from_pairs([
            ("720p", vec![MirrorEntry::new("A720", &t720)]),
            ("1080p", vec![MirrorEntry::new("B1080", &blank)]),
        ]);

        let ranked = QualitySelector::rank(&tiers);
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["B1080", "A720"]);
        assert_eq!(ranked[0].quality, QualityLabel::P1080);
    }

    #[tokio::test]
    async fn test_select_attempts_best_quality_first() {
        let (t480, t1080, t720) = (token("480p", 0), token("1080p", 1), token("720p", 2));
        let tiers = MirrorTiers::from_pairs([
            ("480p", vec![MirrorEntry::new("A", &t480)]),
            ("1080p", vec![MirrorEntry::new("B", &t1080)]),
            ("720p", vec![MirrorEntry::new("C", &t720)]),
        ]);
        // Everything fails so the full attempt order is observable
        let resolver = Arc::new(ScriptedResolver::new(&[&t480, &t1080, &t720]));
        let selector = QualitySelector::new(resolver.clone());

        let err = selector
            .select(&tiers, &ResolveContext::new())
            .await
            .unwrap_err();

        assert_eq!(resolver.calls(), vec![t1080, t720, t480]);
        assert!(matches!(err, ResolveError::NoMirrorAvailable { tried: 3 }));
    }

    #[tokio::test]
    async fn test_select_falls_through_to_next_mirror() {
        let (t1, t2) = (token("720p", 0), token("1080p", 1));
        let tiers = MirrorTiers::from_pairs([
            ("720p", vec![MirrorEntry::new("M1", &t1)]),
            ("1080p", vec![MirrorEntry::new("M2", &t2)]),
        ]);
        let resolver = Arc::new(ScriptedResolver::new(&[&t2]));
        let selector = QualitySelector::new(resolver.clone());

        let selected = selector
            .select(&tiers, &ResolveContext::new())
            .await
            .unwrap();

        assert_eq!(resolver.calls(), vec![t2, t1.clone()]);
        assert_eq!(selected.name, "M1");
        assert_eq!(selected.url, format!("https://player.test/{t1}"));
        assert_eq!(selected.quality, QualityLabel::P720);
    }

    #[tokio::test]
    async fn test_select_empty_tiers_is_unavailable() {
        let selector = QualitySelector::new(Arc::new(ScriptedResolver::succeeding()));
        let err = selector
            .select(&MirrorTiers::default(), &ResolveContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), FailureReason::NoMirrorAvailable);
    }

    #[tokio::test]
    async fn test_select_stops_when_cancelled() {
        let (t1, t2) = (token("1080p", 0), token("720p", 1));
        let tiers = MirrorTiers::from_pairs([(
            "any",
            vec![MirrorEntry::new("M1", &t1), MirrorEntry::new("M2", &t2)],
        )]);
        let ctx = ResolveContext::new();
        let mut resolver = ScriptedResolver::new(&[&t1, &t2]);
        resolver.cancel_after_first = Some(ctx.clone());
        let resolver = Arc::new(resolver);
        let selector = QualitySelector::new(resolver.clone());

        let err = selector.select(&tiers, &ctx).await.unwrap_err();

        assert_eq!(err.reason(), FailureReason::Cancelled);
        assert_eq!(resolver.calls(), vec![t1]);
    }

    #[tokio::test]
    async fn test_select_named_resolves_only_that_mirror() {
        let (t1, t2) = (token("1080p", 0), token("720p", 1));
        let tiers = MirrorTiers::from_pairs([(
            "any",
            vec![MirrorEntry::new("Best", &t1), MirrorEntry::new("Backup", &t2)],
        )]);
        let resolver = Arc::new(ScriptedResolver::succeeding());
        let selector = QualitySelector::new(resolver.clone());

        let selected = selector
            .select_named(&tiers, "backup", &ResolveContext::new())
            .await
            .unwrap();

        assert_eq!(selected.name, "Backup");
        assert_eq!(resolver.calls(), vec![t2]);

        let err = selector
            .select_named(&tiers, "nope", &ResolveContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), FailureReason::InvalidInput);
    }
}
