//! Media metadata used to describe a scheduled session.
//!
//! Lookups are best effort: whatever fails is replaced by placeholder text or
//! the default runtime so scheduling always goes ahead.

use crate::error::{Result, WatchError};
use crate::models::{MediaKind, WatchEntry};
use image::{ImageFormat, ImageReader};
use std::future::Future;
use std::io::Cursor;
use tracing::{debug, info, warn};

pub const DEFAULT_RUNTIME_MINUTES: u32 = 25;
pub const NOT_FOUND_OVERVIEW: &str = "TMDB info not found.";
pub const NO_DESCRIPTION: &str = "No description available.";

/// Top search hit for a title.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMatch {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub runtime_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeInfo {
    pub name: Option<String>,
    pub overview: Option<String>,
    pub runtime_minutes: Option<u32>,
}

/// Everything the scheduler needs from the media database.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDetails {
    pub runtime_minutes: u32,
    pub overview: String,
    pub poster: Option<Vec<u8>>,
}

impl Default for MediaDetails {
    fn default() -> Self {
        Self {
            runtime_minutes: DEFAULT_RUNTIME_MINUTES,
            overview: NOT_FOUND_OVERVIEW.to_string(),
            poster: None,
        }
    }
}

pub trait MediaLookup: Send + Sync {
    /// First search result only; several matches are never disambiguated.
    fn resolve_top(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> impl Future<Output = Result<MediaMatch>> + Send;

    fn resolve_episode(
        &self,
        media_id: u64,
        season: u32,
        episode: u32,
    ) -> impl Future<Output = Result<EpisodeInfo>> + Send;

    fn fetch_poster_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Collects runtime, overview and poster for the entry's next session.
pub async fn resolve_details<M: MediaLookup>(
    media: &M,
    title: &str,
    entry: &WatchEntry,
) -> MediaDetails {
    let mut details = MediaDetails::default();

    let found = match media.resolve_top(title, entry.kind).await {
        Ok(found) => found,
        Err(e) => {
            warn!("No media match for '{}': {}", title, e);
            return details;
        }
    };
    info!("Matched '{}' to '{}' (id {})", title, found.title, found.id);

    details.overview = non_empty(found.overview).unwrap_or_else(|| NO_DESCRIPTION.to_string());
    if let Some(runtime) = found.runtime_minutes.filter(|r| *r > 0) {
        details.runtime_minutes = runtime;
    }

    if let Some(url) = &found.poster_url {
        match media.fetch_poster_bytes(url).await {
            Ok(bytes) => details.poster = Some(bytes),
            Err(e) => warn!("Skipping poster for '{}': {}", title, e),
        }
    }

    if entry.kind == MediaKind::Tv {
        match media
            .resolve_episode(found.id, entry.current_season, entry.current_episode)
            .await
        {
            Ok(episode) => {
                if let Some(name) = &episode.name {
                    debug!("Using details of episode '{}'", name);
                }
                if let Some(runtime) = episode.runtime_minutes.filter(|r| *r > 0) {
                    details.runtime_minutes = runtime;
                }
                if let Some(overview) = non_empty(episode.overview) {
                    details.overview = overview;
                }
            }
            Err(e) => debug!(
                "Episode S{}E{} of '{}' unavailable, keeping show overview: {}",
                entry.current_season, entry.current_episode, title, e
            ),
        }
    }

    details
}

/// Accepts JPEG and PNG only, judged by the decoded header rather than the URL.
pub fn validate_poster(bytes: Vec<u8>) -> Result<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {
            let (width, height) = reader
                .into_dimensions()
                .map_err(|e| WatchError::UnsupportedFormat(e.to_string()))?;
            debug!("Poster is {}x{}", width, height);
            Ok(bytes)
        }
        Some(other) => Err(WatchError::UnsupportedFormat(format!("{:?}", other).to_lowercase())),
        None => Err(WatchError::UnsupportedFormat("unknown".to_string())),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
