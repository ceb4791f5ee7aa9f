//! Named statistic kinds for generic, tabular reports
//!
//! Consumers iterate [`Statistic::ALL`] and call [`Statistic::value`] instead of
//! branching on each statistic themselves.

use crate::cache::AnalysisCache;
use crate::error::{AnalysisError, Result};
use crate::series::MetricSeriesSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Average,
    WeightedAverage,
    Minimum,
    Maximum,
    GranularityMaximum,
    StdDev,
    Median,
    Percentile95,
    Percentile99,
    Sum,
    Count,
}

impl Statistic {
    /// Every statistic in report column order
    pub const ALL: [Statistic; 11] = [
        Statistic::Average,
        Statistic::WeightedAverage,
        Statistic::Minimum,
        Statistic::Maximum,
        Statistic::GranularityMaximum,
        Statistic::StdDev,
        Statistic::Median,
        Statistic::Percentile95,
        Statistic::Percentile99,
        Statistic::Sum,
        Statistic::Count,
    ];

    /// Short identifier used on command lines and in query strings
    pub fn id(&self) -> &'static str {
        match self {
            Statistic::Average => "avg",
            Statistic::WeightedAverage => "wavg",
            Statistic::Minimum => "min",
            Statistic::Maximum => "max",
            Statistic::GranularityMaximum => "peak",
            Statistic::StdDev => "stddev",
            Statistic::Median => "median",
            Statistic::Percentile95 => "p95",
            Statistic::Percentile99 => "p99",
            Statistic::Sum => "sum",
            Statistic::Count => "count",
        }
    }

    /// Display name; the peak column depends on the bound granularity
    pub fn name(&self, granularity_ms: i64) -> String {
        match self {
            Statistic::Average => "Average".to_string(),
            Statistic::WeightedAverage => "Weighted Average".to_string(),
            Statistic::Minimum => "Minimum".to_string(),
            Statistic::Maximum => "Maximum".to_string(),
            Statistic::GranularityMaximum => peak_name(granularity_ms),
            Statistic::StdDev => "Std Dev".to_string(),
            Statistic::Median => "Median".to_string(),
            Statistic::Percentile95 => "95th Percentile".to_string(),
            Statistic::Percentile99 => "99th Percentile".to_string(),
            Statistic::Sum => "Sum".to_string(),
            Statistic::Count => "Count".to_string(),
        }
    }

    /// Read this statistic for `(type_id, field)` from `cache`
    ///
    /// `Count` is returned as a float so every statistic fits one column type.
    pub fn value<S: MetricSeriesSource>(
        &self,
        cache: &mut AnalysisCache<S>,
        type_id: &str,
        field: &str,
    ) -> Result<f64> {
        match self {
            Statistic::Average => cache.average(type_id, field),
            Statistic::WeightedAverage => cache.weighted_average(type_id, field),
            Statistic::Minimum => cache.minimum(type_id, field),
            Statistic::Maximum => cache.maximum(type_id, field),
            Statistic::GranularityMaximum => cache.granularity_maximum(type_id, field),
            Statistic::StdDev => cache.standard_deviation(type_id, field),
            Statistic::Median => cache.median(type_id, field),
            Statistic::Percentile95 => cache.percentile_95(type_id, field),
            Statistic::Percentile99 => cache.percentile_99(type_id, field),
            Statistic::Sum => cache.sum(type_id, field),
            Statistic::Count => cache.count(type_id, field).map(|c| c as f64),
        }
    }
}

fn peak_name(granularity_ms: i64) -> String {
    if granularity_ms < 1000 {
        return format!("{}ms Peak", granularity_ms);
    }

    let seconds = granularity_ms / 1000;
    if seconds < 60 {
        format!("{}s Peak", seconds)
    } else {
        format!("{}:{:02} Peak (mm:ss)", seconds / 60, seconds % 60)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Statistic {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Statistic::ALL
            .iter()
            .copied()
            .find(|stat| {
                stat.id() == wanted
                    || stat.name(crate::cache::DEFAULT_GRANULARITY_MS).to_lowercase() == wanted
            })
            .ok_or_else(|| AnalysisError::InvalidArgument(format!("unknown statistic '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;
    use crate::series::{DataRecord, DataSet};
    use std::sync::Arc;

    fn create_test_cache() -> AnalysisCache<DataSet> {
        let mut dataset = DataSet::new("test-host");
        dataset.add_type(DataType::new(
            "DISKBUSY",
            "Disk %Busy",
            vec!["sda".to_string()],
        ));
        for (i, v) in [10.0, 20.0, 30.0, 40.0, 50.0].iter().enumerate() {
            dataset.add_record(
                DataRecord::new(i as i64 * 60_000).with_value("DISKBUSY", "sda", *v),
            );
        }
        AnalysisCache::new(Arc::new(dataset))
    }

    #[test]
    fn test_peak_names() {
        assert_eq!(Statistic::GranularityMaximum.name(1_000), "1s Peak");
        assert_eq!(Statistic::GranularityMaximum.name(30_000), "30s Peak");
        assert_eq!(Statistic::GranularityMaximum.name(59_000), "59s Peak");
        assert_eq!(Statistic::GranularityMaximum.name(60_000), "1:00 Peak (mm:ss)");
        assert_eq!(Statistic::GranularityMaximum.name(90_000), "1:30 Peak (mm:ss)");
        assert_eq!(Statistic::GranularityMaximum.name(605_000), "10:05 Peak (mm:ss)");
        assert_eq!(Statistic::GranularityMaximum.name(250), "250ms Peak");
    }

    #[test]
    fn test_static_names() {
        assert_eq!(Statistic::StdDev.name(60_000), "Std Dev");
        assert_eq!(Statistic::Percentile95.name(60_000), "95th Percentile");
    }

    #[test]
    fn test_dispatch_matches_cache() {
        let mut cache = create_test_cache();

        assert_eq!(Statistic::Average.value(&mut cache, "DISKBUSY", "sda").unwrap(), 30.0);
        assert_eq!(Statistic::Sum.value(&mut cache, "DISKBUSY", "sda").unwrap(), 150.0);
        assert_eq!(Statistic::Count.value(&mut cache, "DISKBUSY", "sda").unwrap(), 5.0);
        assert_eq!(Statistic::Median.value(&mut cache, "DISKBUSY", "sda").unwrap(), 30.0);
        assert_eq!(Statistic::Maximum.value(&mut cache, "DISKBUSY", "sda").unwrap(), 50.0);
        assert_eq!(
            Statistic::GranularityMaximum
                .value(&mut cache, "DISKBUSY", "sda")
                .unwrap(),
            50.0
        );
    }

    #[test]
    fn test_dispatch_missing_data() {
        let mut cache = create_test_cache();

        for stat in Statistic::ALL {
            let value = stat.value(&mut cache, "DISKBUSY", "sdb").unwrap();
            match stat {
                Statistic::Count | Statistic::Sum => assert_eq!(value, 0.0),
                _ => assert!(value.is_nan(), "{} should be NaN", stat),
            }
        }
    }

    #[test]
    fn test_dispatch_validates_arguments() {
        let mut cache = create_test_cache();
        assert!(Statistic::Average.value(&mut cache, "", "sda").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("p95".parse::<Statistic>().unwrap(), Statistic::Percentile95);
        assert_eq!("Std Dev".parse::<Statistic>().unwrap(), Statistic::StdDev);
        assert_eq!(
            "weighted_average".parse::<Statistic>().unwrap(),
            Statistic::WeightedAverage
        );
        assert_eq!(" PEAK ".parse::<Statistic>().unwrap(), Statistic::GranularityMaximum);
        assert!("p42".parse::<Statistic>().is_err());
    }

    #[test]
    fn test_all_has_every_variant_once() {
        let ids: std::collections::HashSet<_> = Statistic::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), 11);
    }
}
