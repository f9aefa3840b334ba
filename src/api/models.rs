//! Response models for the upstream catalog API.
//!
//! Field names follow the upstream (Indonesian) JSON keys. Unknown fields are
//! ignored. Missing and `null` fields both take their default, since the
//! upstream omits and nulls fields freely.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::mirror::MirrorTiers;

/// Anime summary as returned by list, search and schedule endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anime {
    /// Title.
    #[serde(deserialize_with = "null_as_default")]
    pub judul: String,
    /// Slug used by detail endpoints.
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    /// Poster image URL.
    pub gambar: Option<String>,
    /// Episode labels.
    #[serde(deserialize_with = "null_as_default")]
    pub eps: Vec<String>,
    /// Rating labels.
    #[serde(deserialize_with = "null_as_default")]
    pub rate: Vec<String>,
}

/// Genre entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genre {
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub judul: String,
    /// Slug accepted by the `genre` filter.
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
}

/// One weekday of the airing schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDay {
    /// Day name.
    #[serde(deserialize_with = "null_as_default")]
    pub hari: String,
    /// Anime airing that day.
    #[serde(deserialize_with = "null_as_default")]
    pub anime: Vec<Anime>,
}

/// Reference to an episode, batch or complete release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeRef {
    /// Title.
    #[serde(deserialize_with = "null_as_default")]
    pub judul: String,
    /// Slug.
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    /// Release date label.
    #[serde(deserialize_with = "null_as_default")]
    pub tanggal: String,
}

/// Anime detail with episode list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimeInfo {
    /// Poster image URL.
    #[serde(deserialize_with = "null_as_default")]
    pub gambar: String,
    /// Title.
    #[serde(deserialize_with = "null_as_default")]
    pub judul: String,
    /// Romanized name.
    #[serde(deserialize_with = "null_as_default")]
    pub nama: String,
    /// Japanese name.
    #[serde(deserialize_with = "null_as_default")]
    pub nama_japan: String,
    /// Score.
    #[serde(deserialize_with = "null_as_default")]
    pub skor: String,
    /// Producers.
    #[serde(deserialize_with = "null_as_default")]
    pub produser: String,
    /// Type (TV, Movie, ...).
    #[serde(deserialize_with = "null_as_default")]
    pub tipe: String,
    /// Airing status.
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    /// Total episode count label.
    #[serde(deserialize_with = "null_as_default")]
    pub total_episode: String,
    /// Episode duration label.
    #[serde(deserialize_with = "null_as_default")]
    pub durasi: String,
    /// Release date label.
    #[serde(deserialize_with = "null_as_default")]
    pub rilis: String,
    /// Studio.
    #[serde(deserialize_with = "null_as_default")]
    pub studio: String,
    /// Comma-separated genres.
    #[serde(deserialize_with = "null_as_default")]
    pub genre: String,
    /// Episodes, newest first as served.
    #[serde(deserialize_with = "null_as_default")]
    pub episodes: Vec<EpisodeRef>,
    /// Batch download release, if any.
    pub batch: Option<EpisodeRef>,
    /// Complete release, if any.
    pub lengkap: Option<EpisodeRef>,
}

/// A direct download link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadLink {
    /// Host name.
    #[serde(deserialize_with = "null_as_default")]
    pub nama: String,
    /// Link URL.
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
}

/// Episode detail with download links and streaming mirrors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeDetail {
    /// Episode title, when provided.
    pub judul: Option<String>,
    /// Download links per quality/format key.
    #[serde(deserialize_with = "null_as_default")]
    pub download: BTreeMap<String, Vec<DownloadLink>>,
    /// Streaming mirrors per quality tier, in upstream order.
    pub mirror: MirrorTiers,
}

/// Filters for the anime listing endpoint. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimeQuery {
    /// Free-text search.
    pub search: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Listing type (e.g. "ongoing", "complete").
    pub kind: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl AnimeQuery {
    /// Search query for `text`.
    #[must_use]
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    /// Listing for a genre slug.
    #[must_use]
    pub fn genre(slug: impl Into<String>) -> Self {
        Self {
            genre: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Deserializes `null` as `T::default()`; missing keys are covered by
/// `#[serde(default)]`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
