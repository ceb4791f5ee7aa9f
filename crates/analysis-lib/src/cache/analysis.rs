//! Per-source memoizing statistics cache

use super::stats::{compute_stats, StatsBlock};
use crate::error::{AnalysisError, Result};
use crate::interval::Interval;
use crate::models::DataKey;
use crate::observability::AnalysisMetrics;
use crate::series::MetricSeriesSource;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default peak sub-window (1 minute)
pub const DEFAULT_GRANULARITY_MS: i64 = 60_000;

/// Default number of memoized blocks before LRU eviction kicks in
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Lazily computed statistics for one series source
///
/// Queries take `&mut self` because a miss installs a new block. The cache has
/// no internal locking: share it behind a `Mutex` when more than one task
/// issues queries.
pub struct AnalysisCache<S: MetricSeriesSource> {
    source: Arc<S>,
    interval: Interval,
    granularity: i64,
    entries: LruCache<DataKey, Arc<StatsBlock>>,
    invalidations: u64,
    metrics: AnalysisMetrics,
}

impl<S: MetricSeriesSource> AnalysisCache<S> {
    /// Create a cache over `source` bound to all data, one-minute granularity
    pub fn new(source: Arc<S>) -> Self {
        Self::with_capacity(source, DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` blocks (minimum 1)
    pub fn with_capacity(source: Arc<S>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            interval: Interval::DEFAULT,
            granularity: DEFAULT_GRANULARITY_MS,
            entries: LruCache::new(capacity),
            invalidations: 0,
            metrics: AnalysisMetrics::new(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn granularity(&self) -> i64 {
        self.granularity
    }

    /// Rebind to `interval`, dropping every block if it differs from the
    /// current one
    pub fn set_interval(&mut self, interval: Interval) {
        if self.interval == interval {
            // Keep the latest display name without touching the blocks
            self.interval = interval;
            return;
        }

        info!(
            old = %self.interval,
            new = %interval,
            "Analysis interval changed"
        );
        self.interval = interval;
        self.clear();
    }

    /// Change the peak sub-window; fails when `granularity_ms < 1`
    ///
    /// A rejected change leaves the memoized blocks untouched.
    pub fn set_granularity(&mut self, granularity_ms: i64) -> Result<()> {
        if granularity_ms < 1 {
            return Err(AnalysisError::InvalidArgument(format!(
                "granularity must be at least 1 ms, got {}",
                granularity_ms
            )));
        }

        if granularity_ms != self.granularity {
            info!(
                old_ms = self.granularity,
                new_ms = granularity_ms,
                "Analysis granularity changed"
            );
            self.granularity = granularity_ms;
            self.clear();
        }

        Ok(())
    }

    /// Drop every memoized block
    ///
    /// Owners call this after the underlying source gains records.
    pub fn clear(&mut self) {
        let entries = self.entries.len();
        self.entries.clear();
        self.invalidations += 1;
        self.metrics.inc_cache_invalidations();
        debug!(entries = entries, "Analysis cache cleared");
    }

    /// Swap in a new snapshot of the source, e.g. after records arrived
    pub fn replace_source(&mut self, source: Arc<S>) {
        self.source = source;
        self.clear();
    }

    /// Drop the block for one key, as memory pressure would
    pub fn evict(&mut self, key: &DataKey) -> bool {
        let evicted = self.entries.pop(key).is_some();
        if evicted {
            self.metrics.inc_cache_evictions();
        }
        evicted
    }

    /// Whether a block for `key` is currently memoized
    pub fn is_cached(&self, key: &DataKey) -> bool {
        self.entries.contains(key)
    }

    /// Number of full clears since this cache was created
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Number of memoized blocks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statistics block for `(type_id, field)`, computing it on a miss
    pub fn stats(&mut self, type_id: &str, field: &str) -> Result<Arc<StatsBlock>> {
        let key = DataKey::new(type_id, field)?;

        if let Some(block) = self.entries.get(&key).cloned() {
            self.metrics.inc_cache_hits();
            return Ok(block);
        }

        self.metrics.inc_cache_misses();
        let start = Instant::now();
        let block = Arc::new(compute_stats(
            self.source.as_ref(),
            &self.interval,
            self.granularity,
            &key.type_id,
            &key.field,
        ));
        let elapsed = start.elapsed();
        self.metrics.observe_recompute_latency(elapsed.as_secs_f64());

        debug!(
            key = %key,
            count = block.count,
            elapsed_us = elapsed.as_micros() as u64,
            "Recomputed statistics block"
        );

        if let Some((evicted, _)) = self.entries.push(key, Arc::clone(&block)) {
            debug!(key = %evicted, "Evicted least recently used block");
            self.metrics.inc_cache_evictions();
        }

        Ok(block)
    }

    pub fn count(&mut self, type_id: &str, field: &str) -> Result<i64> {
        Ok(self.stats(type_id, field)?.count)
    }

    pub fn sum(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.sum)
    }

    pub fn average(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.average)
    }

    /// Time-weighted average, see [`super::time_weighted_average`]
    pub fn weighted_average(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.weighted_average)
    }

    pub fn minimum(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.minimum)
    }

    pub fn maximum(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.maximum)
    }

    /// Highest mean over fully elapsed granularity sub-windows
    pub fn granularity_maximum(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.granularity_maximum)
    }

    pub fn median(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.median)
    }

    pub fn percentile_95(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.percentile_95)
    }

    pub fn percentile_99(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.percentile_99)
    }

    /// Population standard deviation
    pub fn standard_deviation(&mut self, type_id: &str, field: &str) -> Result<f64> {
        Ok(self.stats(type_id, field)?.standard_deviation)
    }
}
