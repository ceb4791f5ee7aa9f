//! Aggregation of one statistic across several series sources
//!
//! Used when comparing hosts: e.g. the median of the per-host CPU averages.
//! Median and p95 go through the same [`percentile`] as the cache.

use crate::cache::percentile;
use serde::Serialize;

/// Summary over per-source values; `NaN` inputs are ignored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub minimum: f64,
    pub maximum: f64,
    pub average: f64,
    pub median: f64,
    pub percentile_95: f64,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        if sorted.is_empty() {
            return Self {
                count: 0,
                minimum: f64::NAN,
                maximum: f64::NAN,
                average: f64::NAN,
                median: f64::NAN,
                percentile_95: f64::NAN,
            };
        }

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            minimum: sorted[0],
            maximum: sorted[count - 1],
            average: sum / count as f64,
            median: percentile(&sorted, 0.5),
            percentile_95: percentile(&sorted, 0.95),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_ignores_nan() {
        let summary = Summary::from_values(&[4.0, f64::NAN, 1.0, 3.0, 2.0]);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.minimum, 1.0);
        assert_eq!(summary.maximum, 4.0);
        assert_eq!(summary.average, 2.5);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.percentile_95, 4.0);
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_values(&[f64::NAN]);
        assert_eq!(summary.count, 0);
        assert!(summary.median.is_nan());
    }
}
