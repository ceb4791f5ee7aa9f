//! `pstat report`: statistics table for one dataset

use analysis_lib::{AnalysisCache, DataKey, DataSet, MetricSeriesSource, Statistic};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use super::{build_cache, load_dataset, resolve_interval};
use crate::output::{
    format_time, format_value, print_grid, print_info, print_json, print_warning, OutputFormat,
};

/// Options for one report run
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub type_id: Option<String>,
    pub field: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub granularity_ms: i64,
    pub stats: Vec<Statistic>,
}

#[derive(Debug, Serialize)]
struct StatisticEntry {
    id: &'static str,
    name: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct ReportRow {
    #[serde(rename = "type")]
    type_id: String,
    field: String,
    statistics: Vec<StatisticEntry>,
}

#[derive(Debug, Serialize)]
struct Report {
    hostname: String,
    interval: String,
    start: i64,
    end: i64,
    granularity_ms: i64,
    rows: Vec<ReportRow>,
}

/// Keys selected by `--type` / `--field`; every key when neither is given
fn select_keys(
    dataset: &DataSet,
    type_id: Option<&str>,
    field: Option<&str>,
) -> Result<Vec<DataKey>> {
    match (type_id, field) {
        (None, None) => Ok(dataset.types().flat_map(|t| t.keys()).collect()),
        (None, Some(_)) => bail!("--field requires --type"),
        (Some(type_id), field) => {
            let Some(data_type) = dataset.data_type(type_id) else {
                bail!("Unknown type '{}'", type_id);
            };
            match field {
                None => Ok(data_type.keys().collect()),
                Some(field) if data_type.has_field(field) => {
                    Ok(vec![DataKey::new(type_id, field)?])
                }
                Some(field) => bail!("Type '{}' has no field '{}'", type_id, field),
            }
        }
    }
}

fn build_rows(
    cache: &mut AnalysisCache<DataSet>,
    keys: &[DataKey],
    stats: &[Statistic],
) -> Result<Vec<ReportRow>> {
    let granularity = cache.granularity();
    let mut rows = Vec::with_capacity(keys.len());

    for key in keys {
        let mut statistics = Vec::with_capacity(stats.len());
        for stat in stats {
            statistics.push(StatisticEntry {
                id: stat.id(),
                name: stat.name(granularity),
                value: stat.value(cache, &key.type_id, &key.field)?,
            });
        }
        rows.push(ReportRow {
            type_id: key.type_id.clone(),
            field: key.field.clone(),
            statistics,
        });
    }

    Ok(rows)
}

pub fn show_report(path: &Path, options: ReportOptions, format: OutputFormat) -> Result<()> {
    let dataset = load_dataset(path)?;
    let keys = select_keys(
        &dataset,
        options.type_id.as_deref(),
        options.field.as_deref(),
    )?;
    let interval = resolve_interval(options.start, options.end)?;
    let stats = if options.stats.is_empty() {
        Statistic::ALL.to_vec()
    } else {
        options.stats
    };

    let hostname = dataset.hostname().to_string();
    let mut cache = build_cache(dataset, interval, options.granularity_ms)?;
    let (start, end) = cache.source().resolve_bounds(cache.interval());
    let record_count = cache.source().records_in_interval(cache.interval()).len();
    debug!(keys = keys.len(), records = record_count, "Building report");

    let rows = build_rows(&mut cache, &keys, &stats)?;
    let mut empty = 0;
    for key in &keys {
        if !cache.stats(&key.type_id, &key.field)?.has_data() {
            empty += 1;
        }
    }

    match format {
        OutputFormat::Json => print_json(&Report {
            hostname,
            interval: cache.interval().to_string(),
            start,
            end,
            granularity_ms: cache.granularity(),
            rows,
        }),
        OutputFormat::Table => {
            print_info(&format!(
                "{} | {} ({} - {}) | {} records",
                hostname,
                cache.interval(),
                format_time(start),
                format_time(end),
                record_count
            ));

            let mut header = vec!["Type".to_string(), "Field".to_string()];
            header.extend(stats.iter().map(|s| s.name(cache.granularity())));

            let grid = rows
                .into_iter()
                .map(|row| {
                    let mut cells = vec![row.type_id, row.field];
                    cells.extend(
                        stats
                            .iter()
                            .zip(&row.statistics)
                            .map(|(stat, entry)| format_value(*stat, entry.value)),
                    );
                    cells
                })
                .collect();
            print_grid(header, grid);

            if empty > 0 {
                print_warning(&format!(
                    "{} of {} fields have no data in this interval",
                    empty,
                    keys.len()
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_lib::{DataRecord, DataType};

    fn create_test_dataset() -> DataSet {
        let mut dataset = DataSet::new("test-host");
        dataset.add_type(DataType::new(
            "CPU_ALL",
            "CPU Total",
            vec!["User%".to_string(), "Sys%".to_string()],
        ));
        dataset.add_type(DataType::new("MEM", "Memory", vec!["active".to_string()]));
        dataset.add_record(
            DataRecord::new(0)
                .with_value("CPU_ALL", "User%", 40.0)
                .with_value("MEM", "active", 1024.0),
        );
        dataset.add_record(DataRecord::new(60_000).with_value("CPU_ALL", "User%", 60.0));
        dataset
    }

    #[test]
    fn test_select_keys() {
        let dataset = create_test_dataset();

        assert_eq!(select_keys(&dataset, None, None).unwrap().len(), 3);
        assert_eq!(select_keys(&dataset, Some("CPU_ALL"), None).unwrap().len(), 2);
        assert_eq!(
            select_keys(&dataset, Some("MEM"), Some("active")).unwrap(),
            vec![DataKey::new("MEM", "active").unwrap()]
        );
        assert!(select_keys(&dataset, Some("NET"), None).is_err());
        assert!(select_keys(&dataset, Some("MEM"), Some("free")).is_err());
        assert!(select_keys(&dataset, None, Some("active")).is_err());
    }

    #[test]
    fn test_build_rows() {
        let dataset = create_test_dataset();
        let keys = select_keys(&dataset, Some("CPU_ALL"), None).unwrap();
        let mut cache = build_cache(dataset, analysis_lib::Interval::DEFAULT, 60_000).unwrap();

        let rows = build_rows(&mut cache, &keys, &[Statistic::Average, Statistic::Count]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field, "User%");
        assert_eq!(rows[0].statistics[0].value, 50.0);
        assert_eq!(rows[0].statistics[1].value, 2.0);
        assert!(rows[1].statistics[0].value.is_nan());
    }
}
