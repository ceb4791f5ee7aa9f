//! Time-series record sources
//!
//! The analysis cache only ever reads from a source. Parsers and collectors
//! that produce records live outside this crate and implement
//! [`MetricSeriesSource`]; [`DataSet`] is the in-memory implementation used by
//! the service, the CLI and the tests.

mod dataset;

pub use dataset::{DataRecord, DataSet};

use crate::interval::Interval;
use crate::models::DataType;

/// A single time-stamped record
pub trait SeriesRecord {
    /// Record time in milliseconds since the Unix epoch
    fn time(&self) -> i64;

    /// Value for `(type_id, field)`, or `None` when this record carries no
    /// sample for it
    fn value_for(&self, type_id: &str, field: &str) -> Option<f64>;
}

/// Ordered, read-only provider of time-series records
pub trait MetricSeriesSource: Send + Sync {
    type Record: SeriesRecord;

    /// Time of the first record, 0 when there are none
    fn start_time(&self) -> i64;

    /// Time of the last record, 0 when there are none
    fn end_time(&self) -> i64;

    /// Metadata for a type, `None` when the source never saw it
    fn data_type(&self, type_id: &str) -> Option<&DataType>;

    /// Records within `interval` in ascending time order
    ///
    /// The sentinel interval selects every record.
    fn records_in_interval(&self, interval: &Interval) -> &[Self::Record];

    fn has_type(&self, type_id: &str) -> bool {
        self.data_type(type_id).is_some()
    }

    fn has_field(&self, type_id: &str, field: &str) -> bool {
        self.data_type(type_id)
            .map(|t| t.has_field(field))
            .unwrap_or(false)
    }

    /// Concrete `(start, end)` bounds for `interval`, clipped to the data
    fn resolve_bounds(&self, interval: &Interval) -> (i64, i64) {
        if interval.is_default() {
            (self.start_time(), self.end_time())
        } else {
            (
                interval.start().max(self.start_time()),
                interval.end().min(self.end_time()),
            )
        }
    }
}
