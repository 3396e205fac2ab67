//! In-memory stand-ins for the gateway, media database and GIF search.

use crate::error::{Result, WatchError};
use crate::gateway::{ChannelRef, Gateway, GatewayError, RoleRef};
use crate::media::{EpisodeInfo, MediaLookup, MediaMatch};
use crate::models::MediaKind;
use crate::schedule::EventRequest;
use crate::tenor::GifSearch;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeGateway {
    channels: HashSet<u64>,
    forbidden: HashSet<u64>,
    roles: HashSet<u64>,
    fail_events: bool,
    next_message_id: AtomicU64,
    sent: Mutex<Vec<(u64, String, u64)>>,
    deleted: Mutex<Vec<(u64, u64)>>,
    events: Mutex<Vec<EventRequest>>,
    roles_added: Mutex<Vec<(u64, u64)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, id: u64) -> Self {
        self.channels.insert(id);
        self
    }

    pub fn with_forbidden_channel(mut self, id: u64) -> Self {
        self.channels.insert(id);
        self.forbidden.insert(id);
        self
    }

    pub fn with_role(mut self, id: u64) -> Self {
        self.roles.insert(id);
        self
    }

    pub fn failing_events(mut self) -> Self {
        self.fail_events = true;
        self
    }

    pub fn sent(&self) -> Vec<(u64, String, u64)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(u64, u64)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<EventRequest> {
        self.events.lock().unwrap().clone()
    }

    pub fn roles_added(&self) -> Vec<(u64, u64)> {
        self.roles_added.lock().unwrap().clone()
    }
}

impl Gateway for FakeGateway {
    async fn resolve_channel(&self, id: u64) -> Option<ChannelRef> {
        self.channels.contains(&id).then(|| ChannelRef {
            id,
            name: format!("channel-{}", id),
        })
    }

    async fn resolve_role(&self, id: u64) -> Option<RoleRef> {
        self.roles.contains(&id).then(|| RoleRef {
            id,
            name: format!("role-{}", id),
        })
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> std::result::Result<u64, GatewayError> {
        if self.forbidden.contains(&channel_id) {
            return Err(GatewayError::Forbidden);
        }
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((channel_id, content.to_string(), id));
        Ok(id)
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> std::result::Result<(), GatewayError> {
        self.deleted.lock().unwrap().push((channel_id, message_id));
        Ok(())
    }

    async fn create_scheduled_event(&self, event: &EventRequest) -> Result<()> {
        if self.fail_events {
            return Err(WatchError::EventCreationFailed("rejected".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn add_role(&self, user_id: u64, role_id: u64) -> std::result::Result<(), GatewayError> {
        self.roles_added.lock().unwrap().push((user_id, role_id));
        Ok(())
    }

    async fn guild_name(&self) -> Option<String> {
        Some("Test Guild".to_string())
    }

    async fn latency(&self) -> Option<Duration> {
        Some(Duration::from_millis(42))
    }
}

pub struct FakeMedia {
    pub top: Option<MediaMatch>,
    pub episode: Option<EpisodeInfo>,
    pub poster: Option<Vec<u8>>,
    episode_requests: Mutex<Vec<(u64, u32, u32)>>,
}

impl FakeMedia {
    /// Knows one show, id 7, with a show-level overview only.
    pub fn found() -> Self {
        Self {
            top: Some(MediaMatch {
                id: 7,
                title: "Dune".to_string(),
                overview: Some("Show overview".to_string()),
                poster_url: None,
                runtime_minutes: None,
            }),
            ..Self::missing()
        }
    }

    pub fn missing() -> Self {
        Self {
            top: None,
            episode: None,
            poster: None,
            episode_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_episode(mut self, episode: EpisodeInfo) -> Self {
        self.episode = Some(episode);
        self
    }

    pub fn with_poster(mut self, bytes: Vec<u8>) -> Self {
        if let Some(top) = self.top.as_mut() {
            top.poster_url = Some("https://image.example/poster.png".to_string());
        }
        self.poster = Some(bytes);
        self
    }

    /// Advertises a poster that cannot be downloaded.
    pub fn with_broken_poster(mut self) -> Self {
        if let Some(top) = self.top.as_mut() {
            top.poster_url = Some("https://image.example/missing.png".to_string());
        }
        self.poster = None;
        self
    }

    pub fn episode_requests(&self) -> Vec<(u64, u32, u32)> {
        self.episode_requests.lock().unwrap().clone()
    }
}

impl MediaLookup for FakeMedia {
    async fn resolve_top(&self, title: &str, _kind: MediaKind) -> Result<MediaMatch> {
        self.top
            .clone()
            .ok_or_else(|| WatchError::NotFound(title.to_string()))
    }

    async fn resolve_episode(&self, media_id: u64, season: u32, episode: u32) -> Result<EpisodeInfo> {
        self.episode_requests
            .lock()
            .unwrap()
            .push((media_id, season, episode));
        self.episode
            .clone()
            .ok_or_else(|| WatchError::NotFound(format!("{} S{}E{}", media_id, season, episode)))
    }

    async fn fetch_poster_bytes(&self, _url: &str) -> Result<Vec<u8>> {
        self.poster
            .clone()
            .ok_or_else(|| WatchError::Io(std::io::Error::other("poster download failed")))
    }
}

pub struct FakeGifs {
    url: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeGifs {
    pub fn empty() -> Self {
        Self {
            url: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::empty()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl GifSearch for FakeGifs {
    async fn search(&self, query: &str) -> Option<String> {
        self.queries.lock().unwrap().push(query.to_string());
        self.url.clone()
    }
}
