//! Statistics computation for a single key
//!
//! Everything here is a pure function of the source records, the interval and
//! the granularity. The cache relies on that to recompute evicted blocks
//! without any observable difference.

use crate::interval::Interval;
use crate::series::{MetricSeriesSource, SeriesRecord};
use serde::Serialize;

/// Memoized statistics for one key under one interval and granularity
///
/// `NaN` marks a statistic with no computable value. `count` is never `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsBlock {
    pub count: i64,
    pub sum: f64,
    pub average: f64,
    pub weighted_average: f64,
    pub median: f64,
    pub percentile_95: f64,
    pub percentile_99: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub granularity_maximum: f64,
    pub standard_deviation: f64,
}

impl StatsBlock {
    /// Block for a key with no usable values
    pub fn empty() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            average: f64::NAN,
            weighted_average: f64::NAN,
            median: f64::NAN,
            percentile_95: f64::NAN,
            percentile_99: f64::NAN,
            minimum: f64::NAN,
            maximum: f64::NAN,
            granularity_maximum: f64::NAN,
            standard_deviation: f64::NAN,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }

    /// Bitwise equality, treating `NaN` payloads as equal to themselves
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.count == other.count
            && [
                (self.sum, other.sum),
                (self.average, other.average),
                (self.weighted_average, other.weighted_average),
                (self.median, other.median),
                (self.percentile_95, other.percentile_95),
                (self.percentile_99, other.percentile_99),
                (self.minimum, other.minimum),
                (self.maximum, other.maximum),
                (self.granularity_maximum, other.granularity_maximum),
                (self.standard_deviation, other.standard_deviation),
            ]
            .iter()
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Rank-based percentile over values sorted ascending
///
/// With `n` values, `idx = floor(n * p)`. When `n * p` is a whole number the
/// result is the mean of `sorted[idx - 1]` and `sorted[idx]`, otherwise it is
/// `sorted[idx]`. `p` is expected in `[0, 1]`; `p = 1` yields the maximum.
/// Every median/percentile in this crate goes through this function.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    let position = n as f64 * p;
    let idx = position.floor() as usize;

    if idx >= n {
        return sorted[n - 1];
    }

    if position - idx as f64 == 0.0 && idx > 0 {
        (sorted[idx] + sorted[idx - 1]) / 2.0
    } else {
        sorted[idx]
    }
}

/// Time-weighted mean of `(time, value)` samples in time order
///
/// Each value is weighted by the time until the next sample; the last value
/// reuses the gap before it. Falls back to the plain mean when there is a
/// single sample or all samples share one timestamp.
pub fn time_weighted_average(samples: &[(i64, f64)]) -> f64 {
    match samples.len() {
        0 => return f64::NAN,
        1 => return samples[0].1,
        _ => {}
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for pair in samples.windows(2) {
        let weight = (pair[1].0 - pair[0].0) as f64;
        weighted_sum += pair[0].1 * weight;
        total_weight += weight;
    }

    let n = samples.len();
    let last_weight = (samples[n - 1].0 - samples[n - 2].0) as f64;
    weighted_sum += samples[n - 1].1 * last_weight;
    total_weight += last_weight;

    if total_weight <= 0.0 {
        let sum: f64 = samples.iter().map(|(_, v)| v).sum();
        return sum / n as f64;
    }

    weighted_sum / total_weight
}

/// Compute the statistics block for `(type_id, field)`
///
/// An unknown type, a type without the field, or a window with no non-`NaN`
/// values all produce [`StatsBlock::empty`].
pub fn compute_stats<S: MetricSeriesSource>(
    source: &S,
    interval: &Interval,
    granularity: i64,
    type_id: &str,
    field: &str,
) -> StatsBlock {
    if !source.has_field(type_id, field) {
        return StatsBlock::empty();
    }

    let (window_start, _) = source.resolve_bounds(interval);

    let mut values = Vec::new();
    let mut samples = Vec::new();
    let mut sum = 0.0;
    let mut minimum = f64::NAN;
    let mut maximum = f64::NAN;

    // Peak tracking over fully elapsed sub-windows
    let mut granularity_maximum = f64::NAN;
    let mut last_granularity_time = window_start;
    let mut window_sum = 0.0;
    let mut window_count = 0u64;

    for record in source.records_in_interval(interval) {
        let Some(value) = record.value_for(type_id, field) else {
            continue;
        };
        if value.is_nan() {
            continue;
        }

        let time = record.time();
        sum += value;
        minimum = if minimum.is_nan() { value } else { minimum.min(value) };
        maximum = if maximum.is_nan() { value } else { maximum.max(value) };
        values.push(value);
        samples.push((time, value));

        window_sum += value;
        window_count += 1;

        if time - last_granularity_time >= granularity {
            let window_average = window_sum / window_count as f64;
            granularity_maximum = if granularity_maximum.is_nan() {
                window_average
            } else {
                granularity_maximum.max(window_average)
            };

            window_sum = 0.0;
            window_count = 0;
            last_granularity_time = time;
        }
    }
    // A trailing partial window never contributes to the peak

    if values.is_empty() {
        return StatsBlock::empty();
    }

    let count = values.len();
    let average = sum / count as f64;

    values.sort_by(f64::total_cmp);

    let squared_deviations: f64 = values.iter().map(|v| (v - average).powi(2)).sum();
    let standard_deviation = (squared_deviations / count as f64).sqrt();

    StatsBlock {
        count: count as i64,
        sum,
        average,
        weighted_average: time_weighted_average(&samples),
        median: percentile(&values, 0.5),
        percentile_95: percentile(&values, 0.95),
        percentile_99: percentile(&values, 0.99),
        minimum,
        maximum,
        granularity_maximum,
        standard_deviation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;
    use crate::series::{DataRecord, DataSet};

    fn dataset_with(values: &[(i64, f64)]) -> DataSet {
        let mut dataset = DataSet::new("test-host");
        dataset.add_type(DataType::new(
            "CPU_ALL",
            "CPU Total",
            vec!["User%".to_string()],
        ));
        for (time, value) in values {
            dataset.add_record(DataRecord::new(*time).with_value("CPU_ALL", "User%", *value));
        }
        dataset
    }

    #[test]
    fn test_percentile_even_count_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
    }

    #[test]
    fn test_percentile_odd_count_picks_element() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), 3.0);
        assert_eq!(percentile(&[7.0], 0.99), 7.0);
    }

    #[test]
    fn test_percentile_hundred_values() {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        assert_eq!(percentile(&values, 0.95), 95.5);
        assert_eq!(percentile(&values, 0.99), 99.5);
        assert_eq!(percentile(&values, 0.5), 50.5);
    }

    #[test]
    fn test_percentile_edges() {
        assert!(percentile(&[], 0.5).is_nan());
        assert_eq!(percentile(&[1.0, 2.0, 3.0], 1.0), 3.0);
        assert_eq!(percentile(&[1.0, 2.0, 3.0], 0.0), 1.0);
    }

    #[test]
    fn test_time_weighted_average() {
        // 10 held for 1 minute, 40 held for 3 minutes, last reuses 3 minutes
        let samples = [(0, 10.0), (60_000, 40.0), (240_000, 0.0)];
        let expected = (10.0 * 60_000.0 + 40.0 * 180_000.0) / 420_000.0;
        assert!((time_weighted_average(&samples) - expected).abs() < 1e-12);

        assert_eq!(time_weighted_average(&[(5, 3.0)]), 3.0);
        assert_eq!(time_weighted_average(&[(5, 2.0), (5, 4.0)]), 3.0);
        assert!(time_weighted_average(&[]).is_nan());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let dataset = dataset_with(&[
            (0, 10.0),
            (60_000, 20.0),
            (120_000, 30.0),
            (180_000, 40.0),
            (240_000, 50.0),
        ]);

        let block = compute_stats(&dataset, &Interval::DEFAULT, 60_000, "CPU_ALL", "User%");

        assert_eq!(block.count, 5);
        assert_eq!(block.sum, 150.0);
        assert_eq!(block.average, 30.0);
        assert_eq!(block.weighted_average, 30.0);
        assert_eq!(block.minimum, 10.0);
        assert_eq!(block.maximum, 50.0);
        assert_eq!(block.median, 30.0);
        assert!((block.standard_deviation - 14.142_135_623_730_951).abs() < 1e-9);
        assert_eq!(block.granularity_maximum, 50.0);
    }

    #[test]
    fn test_nan_values_are_skipped() {
        let dataset = dataset_with(&[(0, 10.0), (60_000, f64::NAN), (120_000, 30.0)]);
        let block = compute_stats(&dataset, &Interval::DEFAULT, 60_000, "CPU_ALL", "User%");

        assert_eq!(block.count, 2);
        assert_eq!(block.sum, 40.0);
        assert_eq!(block.average, 20.0);
    }

    #[test]
    fn test_missing_type_or_field_is_empty() {
        let dataset = dataset_with(&[(0, 10.0)]);

        let block = compute_stats(&dataset, &Interval::DEFAULT, 1_000, "DISKBUSY", "sda");
        assert!(block.bit_eq(&StatsBlock::empty()));

        let block = compute_stats(&dataset, &Interval::DEFAULT, 1_000, "CPU_ALL", "Idle%");
        assert_eq!(block.count, 0);
        assert!(block.minimum.is_nan());
        assert!(block.maximum.is_nan());
        assert!(block.granularity_maximum.is_nan());
    }

    #[test]
    fn test_empty_window() {
        let dataset = dataset_with(&[(0, 10.0), (60_000, 20.0)]);
        let interval = Interval::new(100_000, 200_000).unwrap();
        let block = compute_stats(&dataset, &interval, 1_000, "CPU_ALL", "User%");

        assert_eq!(block.count, 0);
        assert_eq!(block.sum, 0.0);
        assert!(block.average.is_nan());
        assert!(!block.has_data());
    }

    #[test]
    fn test_trailing_partial_window_is_dropped() {
        // Window [0, 60s] closes at 60s with mean 10; the spike at 90s sits in
        // an unfinished window and must not raise the peak
        let dataset = dataset_with(&[(0, 10.0), (60_000, 10.0), (90_000, 100.0)]);
        let block = compute_stats(&dataset, &Interval::DEFAULT, 60_000, "CPU_ALL", "User%");

        assert_eq!(block.maximum, 100.0);
        assert_eq!(block.granularity_maximum, 10.0);
    }

    #[test]
    fn test_no_window_elapsed_has_no_peak() {
        let dataset = dataset_with(&[(0, 10.0), (1_000, 20.0)]);
        let block = compute_stats(&dataset, &Interval::DEFAULT, 60_000, "CPU_ALL", "User%");

        assert_eq!(block.count, 2);
        assert!(block.granularity_maximum.is_nan());
    }

    #[test]
    fn test_constant_series_peak_equals_average() {
        let values: Vec<(i64, f64)> = (0..20).map(|i| (i * 10_000, 42.0)).collect();
        let dataset = dataset_with(&values);
        let block = compute_stats(&dataset, &Interval::DEFAULT, 30_000, "CPU_ALL", "User%");

        assert_eq!(block.granularity_maximum, block.average);
        assert_eq!(block.standard_deviation, 0.0);
    }

    #[test]
    fn test_peak_window_starts_at_interval_start() {
        // The first window opens at the interval start (30s), not at the
        // first record of the dataset
        let dataset = dataset_with(&[
            (0, 1.0),
            (30_000, 5.0),
            (60_000, 7.0),
            (90_000, 9.0),
        ]);
        let interval = Interval::new(30_000, 90_000).unwrap();
        let block = compute_stats(&dataset, &interval, 30_000, "CPU_ALL", "User%");

        // Windows: {5, 7} closes at 60s -> 6, {9} closes at 90s -> 9
        assert_eq!(block.count, 3);
        assert_eq!(block.granularity_maximum, 9.0);
    }
}
