//! Named user intervals and the current interval selection
//!
//! The registry owns a sorted set of intervals plus exactly one current
//! selection, which is always either [`Interval::DEFAULT`] or a member of the
//! set. Every change is broadcast to registered [`IntervalListener`]s.

use crate::cache::AnalysisCache;
use crate::interval::Interval;
use crate::listeners::Listeners;
use crate::observability::AnalysisMetrics;
use crate::series::MetricSeriesSource;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Receives changes from an [`IntervalRegistry`]
pub trait IntervalListener: Send + Sync {
    fn interval_added(&self, _interval: &Interval) {}

    fn interval_removed(&self, _interval: &Interval) {}

    fn intervals_cleared(&self) {}

    /// The current selection changed, or the sentinel was re-selected to
    /// force a recomputation of "all data" bounds
    fn current_interval_changed(&self, _interval: &Interval) {}

    fn interval_renamed(&self, _interval: &Interval) {}
}

/// Sorted set of user intervals with a current selection
pub struct IntervalRegistry {
    intervals: BTreeSet<Interval>,
    current: Interval,
    listeners: Listeners<dyn IntervalListener>,
    metrics: AnalysisMetrics,
}

impl Default for IntervalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalRegistry {
    pub fn new() -> Self {
        Self {
            intervals: BTreeSet::new(),
            current: Interval::DEFAULT,
            listeners: Listeners::new(),
            metrics: AnalysisMetrics::new(),
        }
    }

    /// Shared handle to the listener list
    pub fn listeners(&self) -> Listeners<dyn IntervalListener> {
        self.listeners.clone()
    }

    pub fn add_listener(&self, listener: Arc<dyn IntervalListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn IntervalListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Add a user interval
    ///
    /// Returns `false` without notifying when `interval` is the sentinel or
    /// already present.
    pub fn add_interval(&mut self, interval: Interval) -> bool {
        if interval.is_default() || self.intervals.contains(&interval) {
            return false;
        }

        debug!(interval = %interval, "Adding interval");
        self.intervals.insert(interval.clone());
        self.update_gauge();
        self.listeners.notify(|l| l.interval_added(&interval));
        true
    }

    /// Remove a user interval, resetting the selection if it was current
    pub fn remove_interval(&mut self, interval: &Interval) -> bool {
        let Some(removed) = self.intervals.take(interval) else {
            return false;
        };

        debug!(interval = %removed, "Removing interval");
        self.update_gauge();
        self.listeners.notify(|l| l.interval_removed(&removed));

        if self.current == removed {
            self.select_default();
        }
        true
    }

    /// Remove every user interval and reset the selection to the sentinel
    pub fn clear_intervals(&mut self) {
        info!(count = self.intervals.len(), "Clearing intervals");
        self.intervals.clear();
        self.update_gauge();
        self.listeners.notify(|l| l.intervals_cleared());
        self.select_default();
    }

    /// Rename a member interval without changing its position
    ///
    /// Returns `false` for non-members and for unchanged names.
    pub fn rename_interval(&mut self, interval: &Interval, name: &str) -> bool {
        let Some(mut member) = self.intervals.take(interval) else {
            return false;
        };

        if member.name() == name {
            self.intervals.insert(member);
            return false;
        }

        member.set_name(name);
        if self.current == member {
            self.current.set_name(name);
        }
        self.intervals.insert(member.clone());
        self.listeners.notify(|l| l.interval_renamed(&member));
        true
    }

    /// Select `interval` as current
    ///
    /// The sentinel is always selected and always notifies. A member notifies
    /// only when it differs from the current selection. Any other interval is
    /// ignored. Returns whether listeners were notified.
    pub fn set_current_interval(&mut self, interval: &Interval) -> bool {
        if interval.is_default() {
            self.select_default();
            return true;
        }

        let Some(member) = self.intervals.get(interval) else {
            debug!(interval = %interval, "Ignoring selection of unknown interval");
            return false;
        };

        if *member == self.current {
            return false;
        }

        self.current = member.clone();
        info!(
            interval = %self.current,
            start = self.current.start(),
            end = self.current.end(),
            "Current interval changed"
        );
        let current = self.current.clone();
        self.listeners.notify(|l| l.current_interval_changed(&current));
        true
    }

    pub fn current_interval(&self) -> &Interval {
        &self.current
    }

    /// Member intervals in ascending order
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn contains(&self, interval: &Interval) -> bool {
        self.intervals.contains(interval)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn select_default(&mut self) {
        self.current = Interval::DEFAULT;
        info!("Current interval reset to all data");
        self.listeners
            .notify(|l| l.current_interval_changed(&Interval::DEFAULT));
    }

    fn update_gauge(&self) {
        self.metrics
            .set_registered_intervals(self.intervals.len() as i64);
    }
}

/// Keeps an [`AnalysisCache`] scoped to a registry's current interval
///
/// Re-selecting the sentinel also clears the cache, so "all data" statistics
/// are rebuilt after the source changed.
pub struct CacheBinding<S: MetricSeriesSource> {
    cache: Arc<Mutex<AnalysisCache<S>>>,
}

impl<S: MetricSeriesSource> CacheBinding<S> {
    pub fn new(cache: Arc<Mutex<AnalysisCache<S>>>) -> Self {
        Self { cache }
    }

    /// Bind `cache` to `registry`, syncing it with the current selection
    pub fn attach(registry: &IntervalRegistry, cache: Arc<Mutex<AnalysisCache<S>>>) -> Arc<Self>
    where
        S: 'static,
    {
        let binding = Arc::new(Self::new(cache));
        binding.current_interval_changed(registry.current_interval());
        registry.add_listener(binding.clone());
        binding
    }
}

impl<S: MetricSeriesSource> IntervalListener for CacheBinding<S> {
    fn current_interval_changed(&self, interval: &Interval) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        // Rebinding to a different interval clears on its own
        if interval.is_default() && cache.interval().is_default() {
            cache.clear();
        }
        cache.set_interval(interval.clone());
    }
}
