//! Main entry point for the zipstatic server.
//!
//! Opens the archive once, serves it until Ctrl-C, then drains open
//! connections and releases the archive.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zipstatic::server::shutdown_signal;
use zipstatic::{ArchiveIndex, AssetServer, AssetService, Cli, PathResolver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let index = Arc::new(
        ArchiveIndex::open(&cli.archive)
            .await
            .with_context(|| format!("Failed to index archive {}", cli.archive))?,
    );
    info!(archive = %cli.archive, entries = index.len(), "archive opened");

    let paths = PathResolver::new(cli.default_document.clone()).with_mount(&cli.mount);
    let service = Arc::new(AssetService::new(index.clone(), paths));

    let listener = AssetServer::bind(cli.listen).await?;
    AssetServer::new(service.clone())
        .with_shutdown_timeout(Duration::from_secs(cli.shutdown_timeout))
        .serve(listener, shutdown_signal())
        .await?;

    let validators = service.validators().cached();
    drop(service);

    if let Some(bytes) = index.transferred_bytes() {
        info!("Total bytes transferred: {}", format_size(bytes));
    }
    drop(index);
    info!(validators, "archive closed");

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
