//! Slash command table and the handlers behind it.
//!
//! Handlers are thin: they pull typed options out of an [`Invocation`], run the
//! watchlist operation through the store, and format a [`Reply`].

use crate::config::Configuration;
use crate::error::WatchError;
use crate::gateway::{Gateway, GatewayError};
use crate::media::{self, MediaLookup};
use crate::models::MediaKind;
use crate::schedule::{self, TIMEZONE_CODES};
use crate::store::WatchlistStore;
use crate::tenor::{parse_gif_args, GifSearch};
use crate::watchlist::{self, normalize_title};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
}

#[derive(Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    pub autocomplete: bool,
    pub min_value: Option<i64>,
    pub choices: &'static [&'static str],
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub options: &'static [OptionSpec],
    /// Slow commands acknowledge first and answer once done.
    pub deferred: bool,
}

const TITLE: OptionSpec = OptionSpec {
    name: "title",
    description: "Select a show or movie",
    kind: OptionKind::String,
    required: true,
    autocomplete: true,
    min_value: None,
    choices: &[],
};

const fn int_option(name: &'static str, description: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        description,
        kind: OptionKind::Integer,
        required: true,
        autocomplete: false,
        min_value: Some(1),
        choices: &[],
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "addshow",
        description: "Add a new show or movie to the server's watchlist.",
        options: &[
            OptionSpec {
                name: "title",
                description: "Title of the show or movie",
                kind: OptionKind::String,
                required: true,
                autocomplete: false,
                min_value: None,
                choices: &[],
            },
            OptionSpec {
                name: "is_movie",
                description: "Check if it's a movie instead of a TV show",
                kind: OptionKind::Boolean,
                required: false,
                autocomplete: false,
                min_value: None,
                choices: &[],
            },
        ],
        deferred: false,
    },
    CommandSpec {
        name: "removeshow",
        description: "Remove a show from the watchlist.",
        options: &[TITLE],
        deferred: false,
    },
    CommandSpec {
        name: "setep",
        description: "Update the current episode number for a show.",
        options: &[
            TITLE,
            int_option("season", "Season number"),
            int_option("episode", "Episode number"),
        ],
        deferred: false,
    },
    CommandSpec {
        name: "watched",
        description: "Mark the next episode as watched.",
        options: &[TITLE],
        deferred: false,
    },
    CommandSpec {
        name: "watchlist",
        description: "View the current server watchlist.",
        options: &[],
        deferred: false,
    },
    CommandSpec {
        name: "status",
        description: "Show the current status of a show or movie.",
        options: &[TITLE],
        deferred: false,
    },
    CommandSpec {
        name: "schedule",
        description: "Schedule the next watch session for a show or movie.",
        options: &[
            TITLE,
            OptionSpec {
                name: "time",
                description: "Time for the session (e.g. 'Sunday 8pm')",
                kind: OptionKind::String,
                required: true,
                autocomplete: false,
                min_value: None,
                choices: &[],
            },
            OptionSpec {
                name: "timezone",
                description: "Timezone (UK or NL)",
                kind: OptionKind::String,
                required: true,
                autocomplete: false,
                min_value: None,
                choices: TIMEZONE_CODES,
            },
        ],
        deferred: true,
    },
    CommandSpec {
        name: "gif",
        description: "Send a GIF here, or to a channel mentioned first.",
        options: &[OptionSpec {
            name: "query",
            description: "Search words, optionally starting with #channel",
            kind: OptionKind::String,
            required: false,
            autocomplete: false,
            min_value: None,
            choices: &[],
        }],
        deferred: true,
    },
    CommandSpec {
        name: "ping",
        description: "Responds with Pong! and bot latency.",
        options: &[],
        deferred: false,
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

/// One command call with its already-typed options.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    /// Channel the command was typed in.
    pub channel_id: u64,
    pub options: HashMap<String, OptionValue>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, channel_id: u64) -> Self {
        Self {
            command: command.into(),
            channel_id,
            options: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        self.options.insert(name.to_string(), value);
        self
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.options.get(name) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.options.get(name) {
            Some(OptionValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    fn required_str(&self, name: &'static str) -> Result<&str, CommandError> {
        self.string(name)
            .filter(|s| !s.trim().is_empty())
            .ok_or(CommandError::MissingOption(name))
    }

    fn required_int(&self, name: &'static str) -> Result<i64, CommandError> {
        self.integer(name).ok_or(CommandError::MissingOption(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Only the invoking user sees it.
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[derive(Error, Debug)]
enum CommandError {
    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("missing option `{0}`")]
    MissingOption(&'static str),
}

impl CommandError {
    fn into_reply(self) -> Reply {
        match self {
            CommandError::Watch(e) => Reply::private(e.reply()),
            CommandError::MissingOption(name) => {
                Reply::private(format!("❌ Please provide `{}`.", name))
            }
        }
    }
}

type Outcome = Result<Reply, CommandError>;

pub struct Bot<M, F> {
    config: Arc<Configuration>,
    store: WatchlistStore,
    media: M,
    gifs: F,
}

impl<M: MediaLookup, F: GifSearch> Bot<M, F> {
    pub fn new(config: Arc<Configuration>, store: WatchlistStore, media: M, gifs: F) -> Self {
        Self {
            config,
            store,
            media,
            gifs,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    #[instrument(skip(self, gateway, invocation), fields(command = %invocation.command))]
    pub async fn dispatch<G: Gateway>(&self, gateway: &G, invocation: &Invocation) -> Reply {
        let outcome = match invocation.command.as_str() {
            "addshow" => self.add_show(invocation).await,
            "removeshow" => self.remove_show(invocation).await,
            "setep" => self.set_episode(invocation).await,
            "watched" => self.watched(invocation).await,
            "watchlist" => self.show_watchlist().await,
            "status" => self.show_status(invocation).await,
            "schedule" => self.schedule(gateway, invocation, Utc::now()).await,
            "gif" => self.gif(gateway, invocation).await,
            "ping" => self.ping(gateway).await,
            other => {
                warn!("Unknown command: {}", other);
                return Reply::private(format!("❌ Unknown command `{}`.", other));
            }
        };

        outcome.unwrap_or_else(|e| {
            match &e {
                CommandError::Watch(WatchError::Io(io)) => error!("Watchlist IO failed: {}", io),
                CommandError::Watch(WatchError::EventCreationFailed(reason)) => {
                    error!("Failed to create scheduled event: {}", reason)
                }
                other => debug!("Command rejected: {}", other),
            }
            e.into_reply()
        })
    }

    /// Titles to offer while the user types into a `title` option.
    pub async fn autocomplete(&self, command: &str, partial: &str) -> Vec<String> {
        let list = match self.store.load().await {
            Ok(list) => list,
            Err(e) => {
                warn!("Autocomplete could not read watchlist: {}", e);
                return Vec::new();
            }
        };
        let kind = (command == "setep").then_some(MediaKind::Tv);
        watchlist::suggest_titles(&list, partial, kind)
    }

    async fn add_show(&self, invocation: &Invocation) -> Outcome {
        let title = normalize_title(invocation.required_str("title")?);
        let kind = if invocation.boolean("is_movie").unwrap_or(false) {
            MediaKind::Movie
        } else {
            MediaKind::Tv
        };

        self.store
            .update(|list| watchlist::add(list, &title, kind))
            .await?;
        info!("Added '{}' as {}", title, kind.label());
        Ok(Reply::public(format!(
            "✅ '{}' has been added to the watchlist as a {}!",
            title,
            kind.label()
        )))
    }

    async fn remove_show(&self, invocation: &Invocation) -> Outcome {
        let title = normalize_title(invocation.required_str("title")?);
        self.store
            .update(|list| watchlist::remove(list, &title))
            .await?;
        info!("Removed '{}'", title);
        Ok(Reply::public(format!(
            "🗑️ '{}' has been removed from the watchlist.",
            title
        )))
    }

    async fn set_episode(&self, invocation: &Invocation) -> Outcome {
        let title = normalize_title(invocation.required_str("title")?);
        let season = invocation.required_int("season")?;
        let episode = invocation.required_int("episode")?;

        let entry = self
            .store
            .update(|list| watchlist::set_episode(list, &title, season, episode))
            .await?;
        Ok(Reply::public(format!(
            "📺 '{}' is now set to Season {}, Episode {}.",
            title, entry.current_season, entry.current_episode
        )))
    }

    async fn watched(&self, invocation: &Invocation) -> Outcome {
        let title = normalize_title(invocation.required_str("title")?);
        let entry = self
            .store
            .update(|list| watchlist::mark_watched(list, &title))
            .await?;

        let content = match entry.kind {
            MediaKind::Movie => format!("🎬 You've marked **{}** as watched.", title),
            MediaKind::Tv => format!(
                "✅ Marked episode {} of **{}** as watched. Now set to episode {}.",
                entry.current_episode - 1,
                title,
                entry.current_episode
            ),
        };
        Ok(Reply::public(content))
    }

    async fn show_watchlist(&self) -> Outcome {
        let list = self.store.load().await?;
        if list.is_empty() {
            return Ok(Reply::public("📭 The watchlist is currently empty."));
        }

        let mut message = String::from("🎬 **Watchlist:**\n");
        for (title, entry) in watchlist::list_all(&list) {
            let line = match entry.kind {
                MediaKind::Movie => format!("- 🎬 **{}** (Movie)\n", title),
                MediaKind::Tv => format!(
                    "- 📺 **{}** (S{} E{})\n",
                    title, entry.current_season, entry.current_episode
                ),
            };
            message.push_str(&line);
        }
        Ok(Reply::public(message))
    }

    async fn show_status(&self, invocation: &Invocation) -> Outcome {
        let list = self.store.load().await?;
        let view = watchlist::status(&list, invocation.required_str("title")?)?;
        Ok(Reply::public(view.to_string()))
    }

    /// The session time is saved before the event is created and stays saved if that fails.
    async fn schedule<G: Gateway>(
        &self,
        gateway: &G,
        invocation: &Invocation,
        now: DateTime<Utc>,
    ) -> Outcome {
        let title = normalize_title(invocation.required_str("title")?);
        let time = invocation.required_str("time")?;
        let code = invocation.required_str("timezone")?;

        if !self.store.load().await?.contains_key(&title) {
            return Err(WatchError::NotFound(title).into());
        }
        let zone = schedule::resolve_timezone(code)?;
        let local = schedule::parse_local_time(time, now.with_timezone(&zone).naive_local())?;
        let start = schedule::localize(local, zone)?;

        let entry = self
            .store
            .update(|list| watchlist::set_next_session(list, &title, local))
            .await?;
        info!("Next session for '{}' set to {} ({})", title, local, zone.name());

        let voice_channel_id = self.config.discord.voice_channel_id.unwrap_or_default();
        let Some(channel) = gateway.resolve_channel(voice_channel_id).await else {
            return Err(WatchError::ChannelUnavailable(voice_channel_id).into());
        };

        let details = media::resolve_details(&self.media, &title, &entry).await;
        let event = schedule::schedule(&title, &entry, local, zone, details, channel.id)?;
        gateway.create_scheduled_event(&event).await?;

        Ok(Reply::public(format!(
            "📅 Next session for **{}** scheduled on `{}` ({}) and a Discord event has been created!",
            title,
            watchlist::format_session(&start.naive_local()),
            code.trim().to_uppercase()
        )))
    }

    async fn gif<G: Gateway>(&self, gateway: &G, invocation: &Invocation) -> Outcome {
        let args = invocation.string("query").unwrap_or_default();
        let mut request = parse_gif_args(args);

        let mut target = None;
        if let Some(channel_id) = request.channel_id {
            target = gateway.resolve_channel(channel_id).await;
            if target.is_none() {
                debug!("Channel {} not in this guild, searching the whole text", channel_id);
                request.query = args.trim().to_string();
            }
        }

        let Some(url) = self.gifs.search(&request.query).await else {
            return Ok(Reply::private("Couldn't find a GIF for that 😔"));
        };

        let Some(channel) = target.filter(|c| c.id != invocation.channel_id) else {
            return Ok(Reply::public(url));
        };

        match gateway.send_message(channel.id, &url).await {
            Ok(_) => {
                info!("Sent GIF to #{}", channel.name);
                Ok(Reply::public(format!("Sent your gif to {}", channel.mention())))
            }
            Err(GatewayError::Forbidden) => Ok(Reply::private(
                "I don't have permission to send messages in that channel.",
            )),
            Err(e) => {
                warn!("Sending GIF to {} failed: {}", channel.id, e);
                Ok(Reply::private(
                    "Something went wrong when trying to send the GIF.",
                ))
            }
        }
    }

    async fn ping<G: Gateway>(&self, gateway: &G) -> Outcome {
        let content = match gateway.latency().await {
            Some(latency) => format!("Pong! 🏓 '{}ms'", latency.as_millis()),
            None => "Pong! 🏓".to_string(),
        };
        Ok(Reply::public(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscordConfig;
    use crate::media::{EpisodeInfo, NOT_FOUND_OVERVIEW};
    use crate::testing::{FakeGateway, FakeGifs, FakeMedia};
    use chrono::TimeZone;

    const VOICE: u64 = 900;
    const HERE: u64 = 1;

    struct Harness {
        _dir: tempfile::TempDir,
        bot: Bot<FakeMedia, FakeGifs>,
    }

    fn harness(media: FakeMedia, gifs: FakeGifs) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration {
            discord: DiscordConfig {
                token: "t".to_string(),
                voice_channel_id: Some(VOICE),
                ..DiscordConfig::default()
            },
            ..Configuration::default()
        };
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        Harness {
            _dir: dir,
            bot: Bot::new(Arc::new(config), store, media, gifs),
        }
    }

    fn title_cmd(command: &str, title: &str) -> Invocation {
        Invocation::new(command, HERE).with("title", OptionValue::String(title.to_string()))
    }

    fn schedule_cmd(title: &str, time: &str, zone: &str) -> Invocation {
        title_cmd("schedule", title)
            .with("time", OptionValue::String(time.to_string()))
            .with("timezone", OptionValue::String(zone.to_string()))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn command_table_names_are_unique() {
        let mut names: Vec<_> = COMMANDS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
        assert!(find_command("schedule").unwrap().deferred);
        assert!(find_command("nope").is_none());
    }

    #[tokio::test]
    async fn add_twice_is_rejected() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new();

        let reply = h.bot.dispatch(&gateway, &title_cmd("addshow", "the office")).await;
        assert_eq!(
            reply,
            Reply::public("✅ 'The Office' has been added to the watchlist as a TV show!")
        );

        let reply = h.bot.dispatch(&gateway, &title_cmd("addshow", " The Office ")).await;
        assert!(reply.ephemeral);
        assert_eq!(reply.content, "❌ 'The Office' is already in the watchlist.");
    }

    #[tokio::test]
    async fn episode_flow_and_listing() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new();

        h.bot.dispatch(&gateway, &title_cmd("addshow", "Dune")).await;
        let movie = title_cmd("addshow", "heat").with("is_movie", OptionValue::Boolean(true));
        h.bot.dispatch(&gateway, &movie).await;

        let setep = title_cmd("setep", "dune")
            .with("season", OptionValue::Integer(2))
            .with("episode", OptionValue::Integer(5));
        let reply = h.bot.dispatch(&gateway, &setep).await;
        assert_eq!(reply.content, "📺 'Dune' is now set to Season 2, Episode 5.");

        let reply = h.bot.dispatch(&gateway, &title_cmd("watched", "Dune")).await;
        assert_eq!(
            reply.content,
            "✅ Marked episode 5 of **Dune** as watched. Now set to episode 6."
        );

        let setep_movie = title_cmd("setep", "Heat")
            .with("season", OptionValue::Integer(1))
            .with("episode", OptionValue::Integer(1));
        let reply = h.bot.dispatch(&gateway, &setep_movie).await;
        assert_eq!(reply, Reply::private("🎬 'Heat' is a movie and does not have episodes."));

        let reply = h.bot.dispatch(&gateway, &Invocation::new("watchlist", HERE)).await;
        assert_eq!(
            reply.content,
            "🎬 **Watchlist:**\n- 📺 **Dune** (S2 E6)\n- 🎬 **Heat** (Movie)\n"
        );
    }

    #[tokio::test]
    async fn empty_watchlist_and_missing_titles() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new();

        let reply = h.bot.dispatch(&gateway, &Invocation::new("watchlist", HERE)).await;
        assert_eq!(reply.content, "📭 The watchlist is currently empty.");

        let reply = h.bot.dispatch(&gateway, &title_cmd("removeshow", "Nonexistent")).await;
        assert_eq!(reply, Reply::private("❌ 'Nonexistent' is not in the watchlist."));

        let reply = h.bot.dispatch(&gateway, &Invocation::new("status", HERE)).await;
        assert_eq!(reply, Reply::private("❌ Please provide `title`."));
    }

    #[tokio::test]
    async fn autocomplete_filters_shows_for_setep() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new();
        h.bot.dispatch(&gateway, &title_cmd("addshow", "Star Trek")).await;
        let movie = title_cmd("addshow", "Star Wars").with("is_movie", OptionValue::Boolean(true));
        h.bot.dispatch(&gateway, &movie).await;

        assert_eq!(h.bot.autocomplete("status", "STAR").await.len(), 2);
        assert_eq!(h.bot.autocomplete("setep", "star").await, vec!["Star Trek"]);
    }

    #[tokio::test]
    async fn schedule_creates_event_and_persists_session() {
        let media = FakeMedia::found().with_episode(EpisodeInfo {
            name: None,
            overview: Some("Paul meets the Fremen.".to_string()),
            runtime_minutes: Some(50),
        });
        let h = harness(media, FakeGifs::empty());
        let gateway = FakeGateway::new().with_channel(VOICE);
        h.bot.dispatch(&gateway, &title_cmd("addshow", "Dune")).await;

        let reply = h
            .bot
            .schedule(&gateway, &schedule_cmd("dune", "2030-05-05 20:00", "uk"), now())
            .await
            .unwrap();
        assert_eq!(
            reply.content,
            "📅 Next session for **Dune** scheduled on `Sunday, 05 May 2030 at 08:00 PM` (UK) and a Discord event has been created!"
        );

        let events = gateway.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "🎬 Dune - Season 1 Ep 1");
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2030, 5, 5, 19, 0, 0).unwrap());
        assert_eq!(events[0].end, Utc.with_ymd_and_hms(2030, 5, 5, 19, 50, 0).unwrap());
        assert_eq!(events[0].description, "Paul meets the Fremen.");
        assert_eq!(events[0].channel_id, VOICE);

        let status = h.bot.dispatch(&gateway, &title_cmd("status", "Dune")).await;
        assert!(status.content.contains("Sunday, 05 May 2030 at 08:00 PM"));
    }

    #[tokio::test]
    async fn schedule_rejects_bad_zone_and_time_without_saving() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new().with_channel(VOICE);
        h.bot.dispatch(&gateway, &title_cmd("addshow", "Dune")).await;

        let err = h
            .bot
            .schedule(&gateway, &schedule_cmd("Dune", "2030-05-05 20:00", "FR"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Watch(WatchError::InvalidTimezone(_))));

        let err = h
            .bot
            .schedule(&gateway, &schedule_cmd("Dune", "when pigs fly", "NL"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Watch(WatchError::Unparseable(_))));

        let list = h.bot.store.load().await.unwrap();
        assert_eq!(list["Dune"].next_session, None);
        assert!(gateway.events().is_empty());
    }

    #[tokio::test]
    async fn schedule_degrades_without_metadata() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new().with_channel(VOICE);
        let movie = title_cmd("addshow", "Heat").with("is_movie", OptionValue::Boolean(true));
        h.bot.dispatch(&gateway, &movie).await;

        h.bot
            .schedule(&gateway, &schedule_cmd("Heat", "2030-05-05 20:00", "NL"), now())
            .await
            .unwrap();

        let event = &gateway.events()[0];
        assert_eq!(event.name, "🎬 Heat");
        assert_eq!(event.description, NOT_FOUND_OVERVIEW);
        assert_eq!((event.end - event.start).num_minutes(), 25);
        assert_eq!(event.image, None);
    }

    #[tokio::test]
    async fn schedule_goes_ahead_when_poster_download_fails() {
        let h = harness(FakeMedia::found().with_broken_poster(), FakeGifs::empty());
        let gateway = FakeGateway::new().with_channel(VOICE);
        h.bot.dispatch(&gateway, &title_cmd("addshow", "Dune")).await;

        let reply = h
            .bot
            .schedule(&gateway, &schedule_cmd("Dune", "Sunday at 8pm", "UK"), now())
            .await
            .unwrap();
        assert!(!reply.ephemeral);

        let event = &gateway.events()[0];
        assert_eq!(event.image, None);
        assert_eq!(event.description, "Show overview");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2030, 5, 5, 19, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn failed_event_keeps_saved_session() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new().with_channel(VOICE).failing_events();
        h.bot.dispatch(&gateway, &title_cmd("addshow", "Dune")).await;

        let reply = h
            .bot
            .dispatch(&gateway, &schedule_cmd("Dune", "2030-05-05 20:00", "UK"))
            .await;
        assert_eq!(reply, Reply::private("❌ Failed to create the scheduled event."));

        let list = h.bot.store.load().await.unwrap();
        assert!(list["Dune"].next_session.is_some());
    }

    #[tokio::test]
    async fn missing_voice_channel_aborts() {
        let h = harness(FakeMedia::found(), FakeGifs::empty());
        let gateway = FakeGateway::new();
        h.bot.dispatch(&gateway, &title_cmd("addshow", "Dune")).await;

        let reply = h
            .bot
            .dispatch(&gateway, &schedule_cmd("Dune", "2030-05-05 20:00", "UK"))
            .await;
        assert_eq!(reply, Reply::private("❌ Could not find the voice channel."));
        assert!(gateway.events().is_empty());
    }

    #[tokio::test]
    async fn gif_without_results_replies_politely() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let gateway = FakeGateway::new();

        let reply = h.bot.dispatch(&gateway, &Invocation::new("gif", HERE)).await;
        assert_eq!(reply, Reply::private("Couldn't find a GIF for that 😔"));
        assert_eq!(h.bot.gifs.queries(), vec!["funny"]);
    }

    #[tokio::test]
    async fn gif_goes_to_mentioned_channel() {
        let h = harness(FakeMedia::missing(), FakeGifs::returning("https://g/cat.gif"));
        let gateway = FakeGateway::new().with_channel(55);

        let invocation = Invocation::new("gif", HERE)
            .with("query", OptionValue::String("<#55> cat".to_string()));
        let reply = h.bot.dispatch(&gateway, &invocation).await;

        assert_eq!(reply, Reply::public("Sent your gif to <#55>"));
        assert_eq!(gateway.sent()[0].0, 55);
        assert_eq!(gateway.sent()[0].1, "https://g/cat.gif");
        assert_eq!(h.bot.gifs.queries(), vec!["cat"]);
    }

    #[tokio::test]
    async fn gif_to_unknown_channel_searches_everything_here() {
        let h = harness(FakeMedia::missing(), FakeGifs::returning("https://g/x.gif"));
        let gateway = FakeGateway::new();

        let invocation = Invocation::new("gif", HERE)
            .with("query", OptionValue::String("<#77> dog".to_string()));
        let reply = h.bot.dispatch(&gateway, &invocation).await;

        assert_eq!(reply, Reply::public("https://g/x.gif"));
        assert!(gateway.sent().is_empty());
        assert_eq!(h.bot.gifs.queries(), vec!["<#77> dog"]);
    }

    #[tokio::test]
    async fn gif_forbidden_channel_is_reported() {
        let h = harness(FakeMedia::missing(), FakeGifs::returning("https://g/x.gif"));
        let gateway = FakeGateway::new().with_forbidden_channel(66);

        let invocation = Invocation::new("gif", HERE)
            .with("query", OptionValue::String("<#66>".to_string()));
        let reply = h.bot.dispatch(&gateway, &invocation).await;
        assert_eq!(
            reply,
            Reply::private("I don't have permission to send messages in that channel.")
        );
    }

    #[tokio::test]
    async fn ping_reports_latency() {
        let h = harness(FakeMedia::missing(), FakeGifs::empty());
        let reply = h.bot.dispatch(&FakeGateway::new(), &Invocation::new("ping", HERE)).await;
        assert_eq!(reply.content, "Pong! 🏓 '42ms'");
    }
}
