use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("'{0}' is already in the watchlist")]
    AlreadyExists(String),

    #[error("'{0}' is not in the watchlist")]
    NotFound(String),

    #[error("'{0}' is a movie and has no episodes")]
    WrongKind(String),

    #[error("season {season} episode {episode} is out of range")]
    InvalidProgress { season: i64, episode: i64 },

    #[error("unknown timezone code: {0}")]
    InvalidTimezone(String),

    #[error("could not parse time: {0}")]
    Unparseable(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("channel {0} could not be resolved")]
    ChannelUnavailable(u64),

    #[error("scheduled event creation failed: {0}")]
    EventCreationFailed(String),
}

impl WatchError {
    /// Text sent back to the user who invoked the failing command.
    pub fn reply(&self) -> String {
        match self {
            WatchError::AlreadyExists(title) => {
                format!("❌ '{}' is already in the watchlist.", title)
            }
            WatchError::NotFound(title) => format!("❌ '{}' is not in the watchlist.", title),
            WatchError::WrongKind(title) => {
                format!("🎬 '{}' is a movie and does not have episodes.", title)
            }
            WatchError::InvalidProgress { .. } => {
                format!("❌ Season and episode numbers must be between 1 and {}.", u32::MAX)
            }
            WatchError::InvalidTimezone(_) => {
                "❌ Invalid timezone. Choose either 'UK' or 'NL'.".to_string()
            }
            WatchError::Unparseable(_) => {
                "❌ I couldn't understand that time. Try something like 'Sunday 8pm'.".to_string()
            }
            WatchError::UnsupportedFormat(format) => {
                format!("❌ Unsupported image format: {}", format)
            }
            WatchError::Io(_) => {
                "❌ Couldn't update the watchlist right now. Please try again.".to_string()
            }
            WatchError::ChannelUnavailable(_) => "❌ Could not find the voice channel.".to_string(),
            WatchError::EventCreationFailed(_) => {
                "❌ Failed to create the scheduled event.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
