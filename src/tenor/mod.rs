use crate::config::TenorConfig;
use crate::gateway::parse_channel_mention;
use crate::http::HttpClient;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info, instrument, warn};

const SEARCH_URL: &str = "https://tenor.googleapis.com/v2/search";
const RESULT_LIMIT: &str = "8";
pub const DEFAULT_QUERY: &str = "funny";

pub trait GifSearch: Send + Sync {
    /// URL of one matching GIF, or `None` when nothing usable came back.
    fn search(&self, query: &str) -> impl Future<Output = Option<String>> + Send;
}

pub struct TenorClient {
    http: HttpClient,
    config: Option<TenorConfig>,
}

#[derive(Debug, Deserialize)]
struct TenorResponse {
    #[serde(default)]
    results: Vec<TenorResult>,
}

#[derive(Debug, Deserialize)]
struct TenorResult {
    #[serde(default)]
    media_formats: HashMap<String, TenorMedia>,
}

#[derive(Debug, Deserialize)]
struct TenorMedia {
    url: String,
}

impl TenorClient {
    pub fn new(http: HttpClient, config: Option<TenorConfig>) -> Self {
        Self { http, config }
    }
}

impl GifSearch for TenorClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Option<String> {
        let Some(config) = &self.config else {
            warn!("No Tenor API key configured");
            return None;
        };

        let response: TenorResponse = match self
            .http
            .get_json(
                SEARCH_URL,
                &[
                    ("q", query),
                    ("key", config.api_key.as_str()),
                    ("limit", RESULT_LIMIT),
                    ("media_filter", "minimal"),
                ],
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Tenor search failed: {}", e);
                return None;
            }
        };

        info!("Tenor returned {} results", response.results.len());
        pick_gif(&response.results, &mut rand::thread_rng())
    }
}

/// Uniform pick among the results that have a `gif` rendition.
fn pick_gif<R: Rng>(results: &[TenorResult], rng: &mut R) -> Option<String> {
    let urls: Vec<&str> = results
        .iter()
        .filter_map(|r| r.media_formats.get("gif"))
        .map(|m| m.url.as_str())
        .collect();
    urls.choose(rng).map(|url| url.to_string())
}

/// Arguments of the gif command: an optional leading `<#channel>` then the search words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifRequest {
    pub channel_id: Option<u64>,
    pub query: String,
}

pub fn parse_gif_args(args: &str) -> GifRequest {
    let args = args.trim();
    let mut words = args.split_whitespace();

    if let Some(channel_id) = words.next().and_then(parse_channel_mention) {
        let rest = words.collect::<Vec<_>>().join(" ");
        debug!("GIF targeted at channel {}", channel_id);
        return GifRequest {
            channel_id: Some(channel_id),
            query: if rest.is_empty() { DEFAULT_QUERY.to_string() } else { rest },
        };
    }

    GifRequest {
        channel_id: None,
        query: if args.is_empty() { DEFAULT_QUERY.to_string() } else { args.to_string() },
    }
}
