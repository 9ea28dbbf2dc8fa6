//! Demo server for the axum adapter.
//!
//! Serves `/health` plus a `/users` resource in two API versions, selected
//! with the versioning strategy from the config file.

use std::path::PathBuf;

use axum::Json;
use clap::Parser;
use serde_json::json;

use axum_adapter::config::{load_config, AdapterConfig};
use axum_adapter::lifecycle::shutdown_signal;
use axum_adapter::observability::{logging, metrics};
use axum_adapter::{AxumAdapter, RequestMethod, VersionSpec, VersioningOptions};

#[derive(Parser, Debug)]
#[command(name = "axum-adapter", version, about = "axum HTTP adapter demo server")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AdapterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("axum-adapter v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        versioning = ?config.versioning,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let versioning = VersioningOptions::try_from(&config.versioning)?;
    let mut adapter = AxumAdapter::from_config(&config)?;

    adapter
        .route(RequestMethod::Get, "/health", || async {
            Json(json!({"status": "ok"}))
        })
        .route_versioned(
            RequestMethod::Get,
            "/users",
            VersionSpec::single("1"),
            versioning.clone(),
            || async { Json(json!([{"name": "ada"}])) },
        )?
        .route_versioned(
            RequestMethod::Get,
            "/users",
            VersionSpec::single("2"),
            versioning,
            || async { Json(json!({"data": [{"name": "ada"}], "version": 2})) },
        )?;

    adapter.listen(&config.listener.bind_address).await?;

    shutdown_signal().await;
    adapter.close().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
