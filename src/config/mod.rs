use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_WATCHLIST_PATH: &str = "data/watchlist.json";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Configuration {
    #[serde(default)]
    pub discord: DiscordConfig,
    pub tmdb: Option<TmdbConfig>,
    pub tenor: Option<TenorConfig>,
    pub watchlist: Option<WatchlistConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    #[serde(rename = "voiceChannelId")]
    pub voice_channel_id: Option<u64>,
    #[serde(rename = "welcomeChannelId")]
    pub welcome_channel_id: Option<u64>,
    #[serde(rename = "supportChannelId")]
    pub support_channel_id: Option<u64>,
    #[serde(rename = "roleId")]
    pub role_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenorConfig {
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchlistConfig {
    pub path: PathBuf,
}

impl Configuration {
    /// Reads the YAML file if present, then applies environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;

        if config.discord.token.trim().is_empty() {
            bail!("Discord token missing: set discord.token or DISCORD_TOKEN");
        }
        Ok(config)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Configuration = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid configuration file {}", path))?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        for (key, slot) in [
            ("VOICE_CHANNEL_ID", &mut self.discord.voice_channel_id),
            ("WELCOME_CHANNEL_ID", &mut self.discord.welcome_channel_id),
            ("SUPPORT_CHANNEL_ID", &mut self.discord.support_channel_id),
            ("ROLE_ID", &mut self.discord.role_id),
        ] {
            if let Some(raw) = lookup(key) {
                let id = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a numeric id, got '{}'", key, raw))?;
                *slot = Some(id);
            }
        }
        if let Some(api_key) = lookup("TMDB_API_KEY") {
            self.tmdb = Some(TmdbConfig { api_key });
        }
        if let Some(api_key) = lookup("TENOR_API_KEY") {
            self.tenor = Some(TenorConfig { api_key });
        }
        if let Some(path) = lookup("WATCHLIST_FILE") {
            self.watchlist = Some(WatchlistConfig { path: path.into() });
        }
        Ok(())
    }

    pub fn watchlist_path(&self) -> PathBuf {
        self.watchlist
            .as_ref()
            .map(|w| w.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCHLIST_PATH))
    }
}
