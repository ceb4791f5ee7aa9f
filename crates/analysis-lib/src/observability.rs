//! Observability infrastructure for the analysis library
//!
//! Provides:
//! - Prometheus metrics (cache hits/misses, recomputation latency, invalidations)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for recomputation latency (in seconds)
const RECOMPUTE_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AnalysisMetricsInner> = OnceLock::new();

struct AnalysisMetricsInner {
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    cache_evictions: IntCounter,
    cache_invalidations: IntCounter,
    recompute_latency_seconds: Histogram,
    tracked_fields: IntGauge,
    registered_intervals: IntGauge,
}

impl AnalysisMetricsInner {
    fn new() -> Self {
        Self {
            cache_hits: register_int_counter!(
                "perf_analyzer_cache_hits_total",
                "Statistic queries answered from a memoized block"
            )
            .expect("Failed to register cache_hits"),

            cache_misses: register_int_counter!(
                "perf_analyzer_cache_misses_total",
                "Statistic queries that required a recomputation"
            )
            .expect("Failed to register cache_misses"),

            cache_evictions: register_int_counter!(
                "perf_analyzer_cache_evictions_total",
                "Statistics blocks dropped individually (capacity or explicit eviction)"
            )
            .expect("Failed to register cache_evictions"),

            cache_invalidations: register_int_counter!(
                "perf_analyzer_cache_invalidations_total",
                "Full cache clears caused by interval, granularity or data changes"
            )
            .expect("Failed to register cache_invalidations"),

            recompute_latency_seconds: register_histogram!(
                "perf_analyzer_recompute_latency_seconds",
                "Time spent scanning records to rebuild one statistics block",
                RECOMPUTE_BUCKETS.to_vec()
            )
            .expect("Failed to register recompute_latency_seconds"),

            tracked_fields: register_int_gauge!(
                "perf_analyzer_tracked_fields",
                "Number of (type, field) keys currently tracked"
            )
            .expect("Failed to register tracked_fields"),

            registered_intervals: register_int_gauge!(
                "perf_analyzer_registered_intervals",
                "Number of user-defined intervals"
            )
            .expect("Failed to register registered_intervals"),
        }
    }
}

/// Handle to the process-wide analysis metrics
///
/// Multiple clones share the same underlying metrics.
#[derive(Debug, Clone)]
pub struct AnalysisMetrics {
    _private: (),
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AnalysisMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AnalysisMetricsInner {
        GLOBAL_METRICS.get_or_init(AnalysisMetricsInner::new)
    }

    pub fn inc_cache_hits(&self) {
        self.inner().cache_hits.inc();
    }

    pub fn inc_cache_misses(&self) {
        self.inner().cache_misses.inc();
    }

    pub fn inc_cache_evictions(&self) {
        self.inner().cache_evictions.inc();
    }

    pub fn inc_cache_invalidations(&self) {
        self.inner().cache_invalidations.inc();
    }

    pub fn observe_recompute_latency(&self, duration_secs: f64) {
        self.inner().recompute_latency_seconds.observe(duration_secs);
    }

    pub fn set_tracked_fields(&self, count: i64) {
        self.inner().tracked_fields.set(count);
    }

    pub fn set_registered_intervals(&self, count: i64) {
        self.inner().registered_intervals.set(count);
    }

    pub fn cache_hits(&self) -> u64 {
        self.inner().cache_hits.get()
    }

    pub fn cache_misses(&self) -> u64 {
        self.inner().cache_misses.get()
    }
}

/// Structured logger for analysis events
///
/// Provides consistent JSON-formatted logging for dataset loads, scope
/// changes and report generation.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn log_dataset_loaded(&self, hostname: &str, types: usize, records: usize) {
        info!(
            event = "dataset_loaded",
            node = %self.node_name,
            hostname = %hostname,
            types = types,
            records = records,
            "Dataset loaded"
        );
    }

    pub fn log_interval_changed(&self, interval: &str, start: i64, end: i64) {
        info!(
            event = "interval_changed",
            node = %self.node_name,
            interval = %interval,
            start = start,
            end = end,
            "Current interval changed"
        );
    }

    pub fn log_granularity_changed(&self, old_ms: i64, new_ms: i64) {
        info!(
            event = "granularity_changed",
            node = %self.node_name,
            old_ms = old_ms,
            new_ms = new_ms,
            "Granularity changed"
        );
    }

    pub fn log_cache_invalidated(&self, reason: &str, entries: usize) {
        debug!(
            event = "cache_invalidated",
            node = %self.node_name,
            reason = %reason,
            entries = entries,
            "Analysis cache cleared"
        );
    }

    pub fn log_report_generated(&self, keys: usize, statistics: usize, empty_keys: usize) {
        if empty_keys > 0 {
            warn!(
                event = "report_generated",
                node = %self.node_name,
                keys = keys,
                statistics = statistics,
                empty_keys = empty_keys,
                "Report generated with keys lacking data"
            );
        } else {
            info!(
                event = "report_generated",
                node = %self.node_name,
                keys = keys,
                statistics = statistics,
                "Report generated"
            );
        }
    }

    pub fn log_startup(&self, version: &str, dataset: &str) {
        info!(
            event = "service_started",
            node = %self.node_name,
            version = %version,
            dataset = %dataset,
            "Performance analyzer started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Performance analyzer shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_metrics_creation() {
        let metrics = AnalysisMetrics::new();

        let hits = metrics.cache_hits();
        metrics.inc_cache_hits();
        assert!(metrics.cache_hits() > hits);

        metrics.inc_cache_misses();
        metrics.inc_cache_evictions();
        metrics.inc_cache_invalidations();
        metrics.observe_recompute_latency(0.0002);
        metrics.set_tracked_fields(3);
        metrics.set_registered_intervals(2);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-node");
        assert_eq!(logger.node_name(), "test-node");
    }
}
