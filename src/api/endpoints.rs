//! Typed wrappers for the catalog endpoints.

use tracing::instrument;

use crate::context::ResolveContext;

use super::models::{Anime, AnimeInfo, AnimeQuery, EpisodeDetail, Genre, ScheduleDay};
use super::{ApiClient, FetchError};

const ANIME_PATH: &str = "anime";
const ANIME_INFO_PATH: &str = "anime-info";
const EPISODE_PATH: &str = "anime/episode";
const GENRE_PATH: &str = "genre";
const SCHEDULE_PATH: &str = "jadwal";

impl ApiClient {
    /// `GET /anime?search=&genre=&type=&page=`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_typed`].
    #[instrument(skip(self, ctx))]
    pub async fn list_anime(
        &self,
        query: &AnimeQuery,
        ctx: &ResolveContext,
    ) -> Result<Vec<Anime>, FetchError> {
        let page = query.page.map(|page| page.to_string()).unwrap_or_default();
        let pairs = [
            ("search", query.search.as_deref().unwrap_or_default()),
            ("genre", query.genre.as_deref().unwrap_or_default()),
            ("type", query.kind.as_deref().unwrap_or_default()),
            ("page", page.as_str()),
        ];
        self.fetch_typed(ANIME_PATH, &pairs, ctx).await
    }

    /// `GET /anime-info?slug=`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_typed`].
    #[instrument(skip(self, ctx))]
    pub async fn anime_info(&self, slug: &str, ctx: &ResolveContext) -> Result<AnimeInfo, FetchError> {
        self.fetch_typed(ANIME_INFO_PATH, &[("slug", slug)], ctx).await
    }

    /// `GET /anime/episode?slug=&episode=`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_typed`].
    #[instrument(skip(self, ctx))]
    pub async fn episode(
        &self,
        slug: &str,
        episode: &str,
        ctx: &ResolveContext,
    ) -> Result<EpisodeDetail, FetchError> {
        self.fetch_typed(EPISODE_PATH, &[("slug", slug), ("episode", episode)], ctx)
            .await
    }

    /// `GET /genre`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_typed`].
    pub async fn genres(&self, ctx: &ResolveContext) -> Result<Vec<Genre>, FetchError> {
        self.fetch_typed(GENRE_PATH, &[], ctx).await
    }

    /// `GET /jadwal`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_typed`].
    pub async fn schedule(&self, ctx: &ResolveContext) -> Result<Vec<ScheduleDay>, FetchError> {
        self.fetch_typed(SCHEDULE_PATH, &[], ctx).await
    }
}
