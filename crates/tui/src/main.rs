mod app;
mod state;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use cinefav_core::{
    config::{self, AppConfig},
    FavoritesStore, TmdbClient,
};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(
        config = %config_path.display(),
        data_dir = %config.data_dir.display(),
        "configuration loaded"
    );
    if !config.has_credentials() {
        warn!("no API credentials configured; movie lists will stay empty");
    }

    let store = FavoritesStore::open(&config);
    let client = TmdbClient::new(&config)?;

    let mut app = app::CinefavApp::new(config, client, store);
    app.run().await
}

// The terminal belongs to the UI, so logs only go to a file.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("cinefav.log"))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
