//! Subcommand implementations

pub mod compare;
pub mod report;
pub mod types;

use analysis_lib::{AnalysisCache, DataSet, Interval};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Load a dataset file
pub fn load_dataset(path: &Path) -> Result<DataSet> {
    DataSet::load(path).with_context(|| format!("Could not load {}", path.display()))
}

/// Interval from optional `--start` / `--end`; neither means all data
pub fn resolve_interval(start: Option<i64>, end: Option<i64>) -> Result<Interval> {
    match (start, end) {
        (None, None) => Ok(Interval::DEFAULT),
        (Some(start), Some(end)) => Ok(Interval::new(start, end)?),
        _ => bail!("--start and --end must be given together"),
    }
}

/// Cache over `dataset` scoped to `interval` and `granularity_ms`
pub fn build_cache(
    dataset: DataSet,
    interval: Interval,
    granularity_ms: i64,
) -> Result<AnalysisCache<DataSet>> {
    let mut cache = AnalysisCache::new(Arc::new(dataset));
    cache.set_granularity(granularity_ms)?;
    cache.set_interval(interval);
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_interval() {
        assert!(resolve_interval(None, None).unwrap().is_default());

        let interval = resolve_interval(Some(10), Some(20)).unwrap();
        assert_eq!((interval.start(), interval.end()), (10, 20));

        assert!(resolve_interval(Some(10), None).is_err());
        assert!(resolve_interval(Some(20), Some(10)).is_err());
    }

    #[test]
    fn test_build_cache_rejects_bad_granularity() {
        assert!(build_cache(DataSet::new("h"), Interval::DEFAULT, 0).is_err());
    }
}
