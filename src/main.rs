mod commands;
mod config;
mod discord;
mod error;
mod gateway;
mod http;
mod media;
mod models;
mod schedule;
mod store;
mod tenor;
#[cfg(test)]
mod testing;
mod tmdb;
mod watchlist;
mod welcome;

use anyhow::Result;
use clap::Parser;
use commands::Bot;
use config::Configuration;
use http::HttpClient;
use std::sync::Arc;
use store::WatchlistStore;
use tenor::TenorClient;
use tmdb::TmdbClient;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    info!("Starting watchparty v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Configuration::load(&cli.config)?);
    info!("Configuration loaded (file: {})", cli.config);
    if config.tmdb.is_none() {
        warn!("TMDB_API_KEY not set, scheduled events will use placeholder details");
    }
    if config.discord.voice_channel_id.is_none() {
        warn!("VOICE_CHANNEL_ID not set, /schedule will not be able to create events");
    }

    let http_client = HttpClient::new()?;
    let store = WatchlistStore::new(config.watchlist_path());
    info!("Watchlist file: {}", store.path().display());

    let bot = Bot::new(
        Arc::clone(&config),
        store,
        TmdbClient::new(http_client.clone(), config.tmdb.clone()),
        TenorClient::new(http_client, config.tenor.clone()),
    );

    discord::run(&config, bot).await
}
