/// Movie catalog client (TMDB)
///
/// Trending, search and detail lookups go straight to the upstream API on
/// every call: no cache and no retries. Without an API key every lookup
/// answers with an empty result instead of failing.
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Movie, MovieDetails, Paged},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/500x750?text=No+Image";

/// Image size tokens understood by the image CDN
pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "original";
pub const PROFILE_SIZE: &str = "w185";

const DETAIL_APPENDS: &str = "videos,credits,recommendations";

/// Builds the fully-qualified URL of a catalog image
///
/// Missing or empty paths map to the placeholder image.
pub fn image_url(path: Option<&str>, size: &str) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("{}/{}{}", IMAGE_BASE_URL, size, path),
        _ => PLACEHOLDER_IMAGE_URL.to_string(),
    }
}

/// Read-only access to the movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Today's trending movies, in upstream order
    async fn get_trending(&self) -> AppResult<Vec<Movie>>;

    /// Movies matching a free-text query
    async fn search(&self, query: &str) -> AppResult<Vec<Movie>>;

    /// Extended record with cast, crew, videos and recommendations.
    /// `None` when the catalog is not configured.
    async fn get_details(&self, id: u64) -> AppResult<Option<MovieDetails>>;
}

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl TmdbCatalog {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_api_url.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    /// GET an endpoint with the API key attached
    async fn fetch<T: DeserializeOwned>(
        &self,
        api_key: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .query(&[("api_key", api_key)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbCatalog {
    async fn get_trending(&self) -> AppResult<Vec<Movie>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("TMDB API key not configured, trending is empty");
            return Ok(Vec::new());
        };

        let page: Paged<Movie> = self.fetch(api_key, "/trending/movie/day", &[]).await?;

        tracing::info!(results = page.results.len(), "Trending fetched");

        Ok(page.results)
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Movie>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("TMDB API key not configured, search is empty");
            return Ok(Vec::new());
        };

        let page: Paged<Movie> = self
            .fetch(api_key, "/search/movie", &[("query", query)])
            .await?;

        tracing::info!(
            query = %query,
            results = page.results.len(),
            "Movie search completed"
        );

        Ok(page.results)
    }

    async fn get_details(&self, id: u64) -> AppResult<Option<MovieDetails>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let details: MovieDetails = self
            .fetch(
                api_key,
                &format!("/movie/{}", id),
                &[("append_to_response", DETAIL_APPENDS)],
            )
            .await?;

        tracing::debug!(movie_id = id, cast = details.credits.cast.len(), "Details fetched");

        Ok(Some(details))
    }
}
