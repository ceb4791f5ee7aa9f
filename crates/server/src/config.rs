//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Service configuration, read from `ANALYZER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Node name reported in structured logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// HTTP port for the report API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON dataset produced by the file parsers
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    /// Initial peak sub-window in milliseconds
    #[serde(default = "default_granularity_ms")]
    pub granularity_ms: i64,

    /// Maximum number of memoized statistics blocks
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_dataset_path() -> String {
    "data/dataset.json".to_string()
}

fn default_granularity_ms() -> i64 {
    analysis_lib::DEFAULT_GRANULARITY_MS
}

fn default_cache_capacity() -> usize {
    analysis_lib::DEFAULT_CACHE_CAPACITY
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            dataset_path: default_dataset_path(),
            granularity_ms: default_granularity_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ANALYZER"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid ANALYZER_* configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.granularity_ms, 60_000);
        assert_eq!(config.cache_capacity, 512);
        assert_eq!(config.dataset_path, "data/dataset.json");
    }
}
