//! Statistical analysis library for host performance metrics
//!
//! This crate provides the core functionality for:
//! - Time windows (intervals) and the registry of user-defined intervals
//! - A lazily computed, evictable cache of per-key statistics
//! - Tracking the set of metric fields a consumer is interested in
//! - A generic statistic accessor table for tabular reports
//! - Observability (Prometheus metrics and structured logging)

pub mod cache;
pub mod error;
pub mod fields;
pub mod interval;
pub mod listeners;
pub mod models;
pub mod observability;
pub mod registry;
pub mod series;
pub mod statistic;
pub mod summary;

pub use cache::{percentile, AnalysisCache, StatsBlock, DEFAULT_CACHE_CAPACITY, DEFAULT_GRANULARITY_MS};
pub use error::{AnalysisError, Result};
pub use fields::{FieldSetListener, TrackedFieldSet};
pub use interval::Interval;
pub use listeners::Listeners;
pub use models::*;
pub use observability::{AnalysisMetrics, StructuredLogger};
pub use registry::{CacheBinding, IntervalListener, IntervalRegistry};
pub use series::{DataRecord, DataSet, MetricSeriesSource, SeriesRecord};
pub use statistic::Statistic;
pub use summary::Summary;
