//! Turns "sunday 8pm" plus a timezone code into a scheduled event request.
//!
//! Only the naive local time ends up in the watchlist. Anything that later
//! re-reads `next_session` sees wall-clock time without its zone, so it can be
//! off by the difference between the scheduling zone and the reader's zone.

use crate::error::{Result, WatchError};
use crate::media::MediaDetails;
use crate::models::{MediaKind, WatchEntry};
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use tracing::debug;

/// Codes offered to users, in the order they are shown.
pub const TIMEZONE_CODES: &[&str] = &["UK", "NL"];

const EXACT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Discord caps scheduled event descriptions at 1000 characters.
const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct EventRequest {
    pub name: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub channel_id: u64,
    pub image: Option<Vec<u8>>,
}

pub fn resolve_timezone(code: &str) -> Result<Tz> {
    match code.trim().to_uppercase().as_str() {
        "UK" => Ok(chrono_tz::Europe::London),
        "NL" => Ok(chrono_tz::Europe::Amsterdam),
        _ => Err(WatchError::InvalidTimezone(code.to_string())),
    }
}

/// Parses free text relative to `now`, which is wall-clock time in the user's zone.
pub fn parse_local_time(text: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return Err(WatchError::Unparseable(text.to_string()));
    }

    for format in EXACT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }

    if let Some(offset) = parse_offset(text) {
        return Ok(now + offset);
    }

    // "sunday at 8pm" reads as "sunday 8pm".
    let cleaned = text
        .split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case("at"))
        .collect::<Vec<_>>()
        .join(" ");

    // Anchoring on UTC keeps the arithmetic free of DST jumps; the result is
    // read back as plain wall-clock time.
    let anchor = Utc.from_utc_datetime(&now);
    match parse_date_string(&cleaned, anchor, Dialect::Uk) {
        Ok(parsed) => Ok(parsed.naive_utc()),
        Err(e) => {
            debug!("Could not parse '{}': {}", text, e);
            Err(WatchError::Unparseable(text.to_string()))
        }
    }
}

/// "in 2 hours", "in an hour", "in 3 days".
fn parse_offset(text: &str) -> Option<Duration> {
    let lowered = text.to_lowercase();
    let mut words = lowered.split_whitespace();
    if words.next()? != "in" {
        return None;
    }
    let amount = match words.next()? {
        "a" | "an" => 1,
        n => n.parse::<i64>().ok().filter(|n| *n > 0)?,
    };
    let unit = words.next()?;
    if words.next().is_some() {
        return None;
    }
    match unit.trim_end_matches('s') {
        "min" | "minute" => Some(Duration::minutes(amount)),
        "hr" | "hour" => Some(Duration::hours(amount)),
        "day" => Some(Duration::days(amount)),
        "week" => Some(Duration::weeks(amount)),
        _ => None,
    }
}

/// Attaches `zone` to a wall-clock time. Times skipped by a DST change are rejected;
/// times repeated by one resolve to the earlier instant.
pub fn localize(local: NaiveDateTime, zone: Tz) -> Result<DateTime<Tz>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(at) => Ok(at),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(WatchError::Unparseable(format!(
            "{} does not exist in {}",
            local,
            zone.name()
        ))),
    }
}

pub fn event_name(title: &str, entry: &WatchEntry) -> String {
    match entry.kind {
        MediaKind::Movie => format!("🎬 {}", title),
        MediaKind::Tv => format!(
            "🎬 {} - Season {} Ep {}",
            title, entry.current_season, entry.current_episode
        ),
    }
}

/// Builds the event for `entry`, starting at `local` in `zone` and lasting the runtime.
pub fn schedule(
    title: &str,
    entry: &WatchEntry,
    local: NaiveDateTime,
    zone: Tz,
    details: MediaDetails,
    channel_id: u64,
) -> Result<EventRequest> {
    let start = localize(local, zone)?.with_timezone(&Utc);
    let end = start + Duration::minutes(i64::from(details.runtime_minutes));

    Ok(EventRequest {
        name: event_name(title, entry),
        description: details.overview.chars().take(MAX_DESCRIPTION_CHARS).collect(),
        start,
        end,
        channel_id,
        image: details.poster,
    })
}
