//! Error types for the analysis library
//!
//! Only caller misuse is an error. Missing types, missing fields and empty
//! windows are reported through `NaN` statistics and a zero count instead.

use thiserror::Error;

/// Validation failures raised synchronously to the immediate caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Interval construction with `start >= end`
    #[error("invalid interval range: start {start} must be before end {end}")]
    InvalidRange { start: i64, end: i64 },

    /// Empty type or field name, or a granularity below one millisecond
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
