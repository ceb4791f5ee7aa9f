//! Shared service state
//!
//! Lock order: `registry` or `fields` first, then `cache`. Listeners attached
//! here take the cache lock from inside registry and field-set callbacks.

use analysis_lib::{
    AnalysisCache, CacheBinding, DataKey, DataSet, FieldSetListener, Interval, IntervalListener,
    IntervalRegistry, MetricSeriesSource, StructuredLogger, TrackedFieldSet,
};
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared application state
pub struct AppState {
    pub dataset: Arc<DataSet>,
    pub cache: Arc<Mutex<AnalysisCache<DataSet>>>,
    pub registry: Mutex<IntervalRegistry>,
    pub fields: Mutex<TrackedFieldSet>,
    pub logger: StructuredLogger,
    _binding: Arc<CacheBinding<DataSet>>,
}

impl AppState {
    pub fn new(
        dataset: DataSet,
        granularity_ms: i64,
        cache_capacity: usize,
        logger: StructuredLogger,
    ) -> Result<Self> {
        let dataset = Arc::new(dataset);

        let mut cache = AnalysisCache::with_capacity(dataset.clone(), cache_capacity);
        cache
            .set_granularity(granularity_ms)
            .context("Invalid initial granularity")?;
        let cache = Arc::new(Mutex::new(cache));

        let registry = IntervalRegistry::new();
        let binding = CacheBinding::attach(&registry, cache.clone());
        registry.add_listener(Arc::new(IntervalLogger {
            dataset: dataset.clone(),
            logger: logger.clone(),
        }));

        let fields = TrackedFieldSet::new();
        fields.add_listener(Arc::new(FieldEvictor {
            cache: cache.clone(),
            logger: logger.clone(),
        }));

        Ok(Self {
            dataset,
            cache,
            registry: Mutex::new(registry),
            fields: Mutex::new(fields),
            logger,
            _binding: binding,
        })
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Logs every change of the current interval with its resolved bounds
struct IntervalLogger {
    dataset: Arc<DataSet>,
    logger: StructuredLogger,
}

impl IntervalListener for IntervalLogger {
    fn current_interval_changed(&self, interval: &Interval) {
        let (start, end) = self.dataset.resolve_bounds(interval);
        self.logger
            .log_interval_changed(&interval.to_string(), start, end);
    }
}

/// Drops memoized blocks for keys that are no longer tracked
struct FieldEvictor {
    cache: Arc<Mutex<AnalysisCache<DataSet>>>,
    logger: StructuredLogger,
}

impl FieldSetListener for FieldEvictor {
    fn field_removed(&self, key: &DataKey) {
        lock(&self.cache).evict(key);
    }

    fn cleared(&self) {
        let mut cache = lock(&self.cache);
        let entries = cache.len();
        cache.clear();
        self.logger.log_cache_invalidated("fields_cleared", entries);
    }
}
