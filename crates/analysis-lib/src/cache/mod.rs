//! Statistical analysis cache
//!
//! Statistics for a `(type, field)` key are computed lazily on first access,
//! memoized, and discarded wholesale whenever the bound interval or
//! granularity changes. Blocks may also be dropped at any time (capacity
//! pressure or explicit eviction) and are rebuilt transparently on the next
//! query.

mod analysis;
mod stats;

pub use analysis::{AnalysisCache, DEFAULT_CACHE_CAPACITY, DEFAULT_GRANULARITY_MS};
pub use stats::{compute_stats, percentile, time_weighted_average, StatsBlock};
