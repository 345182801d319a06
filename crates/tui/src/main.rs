mod app;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use gamedex_core::{
    config::{self, AppConfig},
    CatalogClient, LocalStore,
};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    if config.api_key.is_empty() {
        warn!("no catalog API key configured; set GAMEDEX_API_KEY or api_key in config.toml");
    }
    info!(base_url = %config.api_base_url, data_dir = %config.data_dir.display(), "starting gamedex");

    let catalog = CatalogClient::from_config(&config).context("failed to build catalog client")?;
    let store = LocalStore::open(&config);

    let mut app = app::GamedexApp::new(catalog, store);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("gamedex.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
