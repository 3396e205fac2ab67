use crate::error::{Result, WatchError};
use crate::models::{MediaKind, WatchEntry, Watchlist};
use chrono::NaiveDateTime;
use std::fmt;

/// Autocomplete lists are capped at this many choices.
pub const MAX_SUGGESTIONS: usize = 25;

const SESSION_FORMAT: &str = "%A, %d %B %Y at %I:%M %p";

/// Trims the title and capitalises the first letter of every word.
///
/// A letter is upper-cased when the character before it is not a letter, so
/// "the office", " The Office " and "THE OFFICE" all share one key.
pub fn normalize_title(title: &str) -> String {
    let mut normalized = String::with_capacity(title.len());
    let mut previous_is_letter = false;
    for c in title.trim().chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                normalized.extend(c.to_lowercase());
            } else {
                normalized.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            normalized.push(c);
            previous_is_letter = false;
        }
    }
    normalized
}

pub fn add(list: &mut Watchlist, title: &str, kind: MediaKind) -> Result<WatchEntry> {
    let key = normalize_title(title);
    if list.contains_key(&key) {
        return Err(WatchError::AlreadyExists(key));
    }
    let entry = WatchEntry::new(kind);
    list.insert(key, entry.clone());
    Ok(entry)
}

pub fn remove(list: &mut Watchlist, title: &str) -> Result<WatchEntry> {
    let key = normalize_title(title);
    list.shift_remove(&key).ok_or(WatchError::NotFound(key))
}

/// Jumps a show to any episode, backwards included.
pub fn set_episode(list: &mut Watchlist, title: &str, season: i64, episode: i64) -> Result<WatchEntry> {
    let entry = entry_mut(list, title)?;
    if entry.is_movie() {
        return Err(WatchError::WrongKind(normalize_title(title)));
    }
    let (Some(s), Some(e)) = (to_progress(season), to_progress(episode)) else {
        return Err(WatchError::InvalidProgress { season, episode });
    };
    entry.current_season = s;
    entry.current_episode = e;
    Ok(entry.clone())
}

/// Movies get flagged as watched; shows move on by one episode.
/// Seasons never roll over here, that takes an explicit [`set_episode`].
pub fn mark_watched(list: &mut Watchlist, title: &str) -> Result<WatchEntry> {
    let entry = entry_mut(list, title)?;
    match entry.kind {
        MediaKind::Movie => entry.watched = Some(true),
        MediaKind::Tv => {
            entry.current_episode = entry.current_episode.checked_add(1).ok_or(
                WatchError::InvalidProgress {
                    season: i64::from(entry.current_season),
                    episode: i64::from(entry.current_episode) + 1,
                },
            )?;
        }
    }
    entry.next_session = None;
    Ok(entry.clone())
}

pub fn set_next_session(list: &mut Watchlist, title: &str, at: NaiveDateTime) -> Result<WatchEntry> {
    let entry = entry_mut(list, title)?;
    entry.next_session = Some(at);
    Ok(entry.clone())
}

pub fn list_all(list: &Watchlist) -> impl Iterator<Item = (&str, &WatchEntry)> {
    list.iter().map(|(title, entry)| (title.as_str(), entry))
}

pub fn status(list: &Watchlist, title: &str) -> Result<EntryStatus> {
    let key = normalize_title(title);
    let entry = list.get(&key).ok_or_else(|| WatchError::NotFound(key.clone()))?;
    Ok(EntryStatus {
        title: key,
        entry: entry.clone(),
    })
}

/// Titles containing `partial`, ignoring case. `kind` narrows to one kind of entry.
pub fn suggest_titles(list: &Watchlist, partial: &str, kind: Option<MediaKind>) -> Vec<String> {
    let needle = partial.to_lowercase();
    list.iter()
        .filter(|(_, entry)| kind.map_or(true, |k| entry.kind == k))
        .filter(|(title, _)| title.to_lowercase().contains(&needle))
        .map(|(title, _)| title.clone())
        .take(MAX_SUGGESTIONS)
        .collect()
}

pub fn format_session(at: &NaiveDateTime) -> String {
    at.format(SESSION_FORMAT).to_string()
}

fn entry_mut<'a>(list: &'a mut Watchlist, title: &str) -> Result<&'a mut WatchEntry> {
    let key = normalize_title(title);
    match list.get_mut(&key) {
        Some(entry) => Ok(entry),
        None => Err(WatchError::NotFound(key)),
    }
}

fn to_progress(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v >= 1)
}

/// Presentation view of one entry.
#[derive(Debug, Clone)]
pub struct EntryStatus {
    pub title: String,
    pub entry: WatchEntry,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self
            .entry
            .next_session
            .as_ref()
            .map(format_session)
            .unwrap_or_else(|| "Not scheduled".to_string());

        match self.entry.kind {
            MediaKind::Movie => {
                let watched = if self.entry.watched.unwrap_or(false) { "Yes" } else { "No" };
                write!(
                    f,
                    "🎬 **{}**\nType: Movie\nWatched: {}\nNext Watch Session: {}",
                    self.title, watched, session
                )
            }
            MediaKind::Tv => write!(
                f,
                "📺 **{}**\nNext Episode: S{} E{}\nNext Watch Session: {}",
                self.title, self.entry.current_season, self.entry.current_episode, session
            ),
        }
    }
}
