//! Performance analyzer - statistics service for host performance datasets
//!
//! Loads one dataset at startup and serves statistics, scoped by the
//! current interval and peak granularity, over HTTP.

use analysis_lib::{DataSet, StructuredLogger};
use anyhow::{Context, Result};
use perf_analyzer::{api, config::AnalyzerConfig, state::AppState};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ANALYZER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting perf-analyzer");

    let config = AnalyzerConfig::load()?;
    info!(
        node_name = %config.node_name,
        dataset = %config.dataset_path,
        "Analyzer configured"
    );

    let logger = StructuredLogger::new(&config.node_name);

    let dataset = DataSet::load(Path::new(&config.dataset_path))
        .with_context(|| format!("Failed to load dataset {}", config.dataset_path))?;
    logger.log_dataset_loaded(
        dataset.hostname(),
        dataset.types().count(),
        dataset.record_count(),
    );

    let app_state = Arc::new(AppState::new(
        dataset,
        config.granularity_ms,
        config.cache_capacity,
        logger.clone(),
    )?);

    logger.log_startup(ANALYZER_VERSION, &config.dataset_path);

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            logger.log_shutdown("API server exited");
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
