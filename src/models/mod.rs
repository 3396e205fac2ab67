use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Titles mapped to their progress, in insertion order.
pub type Watchlist = IndexMap<String, WatchEntry>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Tv,
    Movie,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Tv => "TV show",
            MediaKind::Movie => "movie",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchEntry {
    // Older files have no type; those entries were all shows.
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default = "first")]
    pub current_season: u32,
    #[serde(default = "first")]
    pub current_episode: u32,
    /// Wall-clock time in whatever zone it was scheduled from. The zone is not stored.
    #[serde(default)]
    pub next_session: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched: Option<bool>,
}

fn first() -> u32 {
    1
}

impl WatchEntry {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            current_season: 1,
            current_episode: 1,
            next_session: None,
            watched: None,
        }
    }

    pub fn is_movie(&self) -> bool {
        self.kind == MediaKind::Movie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_entries_written_by_older_versions() {
        let json = r#"{
            "Dune": {"current_season": 2, "current_episode": 5, "next_session": null},
            "Heat": {"type": "movie", "current_season": 1, "current_episode": 1,
                     "next_session": "2030-05-05T20:00:00", "watched": true}
        }"#;

        let list: Watchlist = serde_json::from_str(json).unwrap();
        assert_eq!(list.keys().collect::<Vec<_>>(), vec!["Dune", "Heat"]);

        let dune = &list["Dune"];
        assert_eq!(dune.kind, MediaKind::Tv);
        assert_eq!((dune.current_season, dune.current_episode), (2, 5));
        assert_eq!(dune.watched, None);

        let heat = &list["Heat"];
        assert!(heat.is_movie());
        assert_eq!(heat.watched, Some(true));
        assert_eq!(
            heat.next_session.unwrap().to_string(),
            "2030-05-05 20:00:00"
        );
    }

    #[test]
    fn omits_watched_flag_until_set() {
        let json = serde_json::to_value(WatchEntry::new(MediaKind::Tv)).unwrap();
        assert_eq!(json["type"], "tv");
        assert!(json.get("watched").is_none());
        assert!(json["next_session"].is_null());
    }
}
