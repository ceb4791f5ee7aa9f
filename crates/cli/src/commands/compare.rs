//! `pstat compare`: one statistic across several datasets

use analysis_lib::{DataKey, Interval, Statistic, Summary};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use super::{build_cache, load_dataset};
use crate::output::{format_value, print_info, print_json, print_table, OutputFormat};

#[derive(Debug, Serialize)]
struct SourceValue {
    hostname: String,
    file: String,
    value: f64,
}

/// Row for the per-source table
#[derive(Tabled, Serialize)]
struct SourceRow {
    #[tabled(rename = "Host")]
    hostname: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Row for the cross-source summary table
#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Sources")]
    count: usize,
    #[tabled(rename = "Min")]
    minimum: String,
    #[tabled(rename = "Max")]
    maximum: String,
    #[tabled(rename = "Average")]
    average: String,
    #[tabled(rename = "Median")]
    median: String,
    #[tabled(rename = "95th Percentile")]
    percentile_95: String,
}

impl SummaryRow {
    fn new(stat: Statistic, summary: &Summary) -> Self {
        Self {
            count: summary.count,
            minimum: format_value(stat, summary.minimum),
            maximum: format_value(stat, summary.maximum),
            average: format_value(stat, summary.average),
            median: format_value(stat, summary.median),
            percentile_95: format_value(stat, summary.percentile_95),
        }
    }
}

#[derive(Debug, Serialize)]
struct Comparison {
    key: DataKey,
    statistic: Statistic,
    statistic_name: String,
    sources: Vec<SourceValue>,
    summary: Summary,
}

pub fn compare(
    files: &[PathBuf],
    key: DataKey,
    stat: Statistic,
    granularity_ms: i64,
    format: OutputFormat,
) -> Result<()> {
    let mut sources = Vec::with_capacity(files.len());

    for file in files {
        let dataset = load_dataset(file)?;
        let hostname = dataset.hostname().to_string();
        let mut cache = build_cache(dataset, Interval::DEFAULT, granularity_ms)?;

        sources.push(SourceValue {
            hostname,
            file: file.display().to_string(),
            value: stat.value(&mut cache, &key.type_id, &key.field)?,
        });
    }

    let values: Vec<f64> = sources.iter().map(|s| s.value).collect();
    let summary = Summary::from_values(&values);

    match format {
        OutputFormat::Json => print_json(&Comparison {
            key,
            statistic: stat,
            statistic_name: stat.name(granularity_ms),
            sources,
            summary,
        }),
        OutputFormat::Table => {
            print_info(&format!("{} of {}", stat.name(granularity_ms), key));

            let rows: Vec<SourceRow> = sources
                .into_iter()
                .map(|s| SourceRow {
                    hostname: s.hostname,
                    file: s.file,
                    value: format_value(stat, s.value),
                })
                .collect();
            print_table(&rows, format);

            println!();
            print_info("Summary");
            print_table(&[SummaryRow::new(stat, &summary)], format);
        }
    }

    Ok(())
}
