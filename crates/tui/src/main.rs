mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use komputer_core::{catalog::CatalogClient, config::AppConfig, store::Store};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = AppConfig::load()?;
    info!(api = %config.base_url(), salary = config.salary, "Starting Komputer Store");

    let client = CatalogClient::new(&config)?;
    let (catalog_tx, catalog_rx) = mpsc::channel(1);
    let fetcher = client.clone();
    tokio::spawn(async move {
        if let Err(err) = fetcher.run(catalog_tx).await {
            tracing::error!("Catalog task error: {err}");
        }
    });

    let mut app = app::StoreApp::new(Store::new(config.salary()), client);
    app.attach_catalog(catalog_rx);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("komputer.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal UI owns stdout, so events only go to the log file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
