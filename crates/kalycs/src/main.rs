//! Kalycs daemon: watches the downloads folder and keeps the catalog current.

use anyhow::{Context, Result};
use kalycs::dirs;
use kalycs_catalog::Catalog;
use kalycs_classifier::Classifier;
use kalycs_logging::LogConfig;
use kalycs_watcher::DownloadsWatcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let app_dir = dirs::app_data_dir().context("Failed to resolve app data directory")?;
    kalycs_logging::init_logging(LogConfig {
        log_dir: app_dir.join("logs"),
        app_name: "kalycsd",
        verbose: false,
    })
    .context("Failed to initialize logging")?;

    info!("Starting up Kalycs");

    let db_path = dirs::database_path()?;
    let catalog = Catalog::open(&db_path)
        .await
        .context("Failed to initialize database")?;
    dirs::restrict_database_permissions(&db_path);

    let classifier = Arc::new(Classifier::new(catalog.clone()));
    classifier
        .load_incoming_project()
        .await
        .context("Failed to load incoming project")?;
    classifier.reload().await.context("Failed to load rules")?;

    let downloads = dirs::downloads_dir().context("Failed to resolve downloads directory")?;

    let token = CancellationToken::new();
    let mut watcher = DownloadsWatcher::new(&token, &downloads, Arc::clone(&classifier))
        .context("Failed to create watcher")?;
    watcher.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Application shutdown");
    watcher.stop();
    catalog.close().await;
    Ok(())
}
