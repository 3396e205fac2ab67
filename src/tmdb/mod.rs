use crate::config::TmdbConfig;
use crate::error::{Result, WatchError};
use crate::http::HttpClient;
use crate::media::{self, EpisodeInfo, MediaLookup, MediaMatch};
use crate::models::MediaKind;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w780";

pub struct TmdbClient {
    http: HttpClient,
    config: Option<TmdbConfig>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResult {
    id: u64,
    // Shows carry `name`, movies carry `title`.
    #[serde(alias = "name")]
    title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EpisodeResponse {
    name: Option<String>,
    overview: Option<String>,
    runtime: Option<u32>,
}

impl SearchResult {
    fn into_match(self, fallback_title: &str) -> MediaMatch {
        MediaMatch {
            id: self.id,
            title: self.title.unwrap_or_else(|| fallback_title.to_string()),
            overview: self.overview,
            poster_url: self
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}{}", POSTER_BASE_URL, p)),
            runtime_minutes: self.runtime,
        }
    }
}

impl TmdbClient {
    pub fn new(http: HttpClient, config: Option<TmdbConfig>) -> Self {
        Self { http, config }
    }

    fn api_key(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.api_key.as_str())
    }

    async fn movie_runtime(&self, api_key: &str, movie_id: u64) -> Option<u32> {
        let url = format!("{}/movie/{}", BASE_URL, movie_id);
        match self.http.get_json::<MovieDetails>(&url, &[("api_key", api_key)]).await {
            Ok(details) => details.runtime,
            Err(e) => {
                debug!("Movie details for {} unavailable: {}", movie_id, e);
                None
            }
        }
    }
}

impl MediaLookup for TmdbClient {
    #[instrument(skip(self))]
    async fn resolve_top(&self, title: &str, kind: MediaKind) -> Result<MediaMatch> {
        let Some(api_key) = self.api_key() else {
            warn!("No TMDB API key configured, skipping lookup");
            return Err(WatchError::NotFound(title.to_string()));
        };

        let endpoint = match kind {
            MediaKind::Tv => "tv",
            MediaKind::Movie => "movie",
        };
        let url = format!("{}/search/{}", BASE_URL, endpoint);
        info!("Searching TMDB {} for: {}", endpoint, title);

        let response: SearchResponse = match self
            .http
            .get_json(&url, &[("api_key", api_key), ("query", title)])
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("TMDB search failed: {}", e);
                return Err(WatchError::NotFound(title.to_string()));
            }
        };

        let Some(top) = response.results.into_iter().next() else {
            info!("TMDB has no results for: {}", title);
            return Err(WatchError::NotFound(title.to_string()));
        };

        let mut found = top.into_match(title);
        if kind == MediaKind::Movie && found.runtime_minutes.is_none() {
            found.runtime_minutes = self.movie_runtime(api_key, found.id).await;
        }
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn resolve_episode(&self, media_id: u64, season: u32, episode: u32) -> Result<EpisodeInfo> {
        let label = format!("{} S{}E{}", media_id, season, episode);
        let Some(api_key) = self.api_key() else {
            return Err(WatchError::NotFound(label));
        };

        let url = format!(
            "{}/tv/{}/season/{}/episode/{}",
            BASE_URL, media_id, season, episode
        );
        match self
            .http
            .get_json::<EpisodeResponse>(&url, &[("api_key", api_key)])
            .await
        {
            Ok(response) => Ok(EpisodeInfo {
                name: response.name,
                overview: response.overview,
                runtime_minutes: response.runtime,
            }),
            Err(e) => {
                debug!("Episode lookup failed: {}", e);
                Err(WatchError::NotFound(label))
            }
        }
    }

    #[instrument(skip(self))]
    async fn fetch_poster_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get_bytes(url)
            .await
            .map_err(|e| WatchError::Io(std::io::Error::other(e.to_string())))?;
        media::validate_poster(bytes)
    }
}
