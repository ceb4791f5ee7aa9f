//! In-memory dataset for a single monitored host

use super::{MetricSeriesSource, SeriesRecord};
use crate::interval::Interval;
use crate::models::{DataSetFile, DataType, RecordEntry};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Timestamped sample row
#[derive(Debug, Clone, Default)]
pub struct DataRecord {
    time: i64,
    values: HashMap<String, HashMap<String, f64>>,
}

impl DataRecord {
    pub fn new(time: i64) -> Self {
        Self {
            time,
            values: HashMap::new(),
        }
    }

    /// Builder-style setter for one value
    pub fn with_value(mut self, type_id: &str, field: &str, value: f64) -> Self {
        self.set_value(type_id, field, value);
        self
    }

    pub fn set_value(&mut self, type_id: &str, field: &str, value: f64) {
        self.values
            .entry(type_id.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }
}

impl From<RecordEntry> for DataRecord {
    /// Unreadable (`null`) samples become `NaN` and are skipped by the analysis
    fn from(entry: RecordEntry) -> Self {
        let values = entry
            .values
            .into_iter()
            .map(|(type_id, fields)| {
                let fields = fields
                    .into_iter()
                    .map(|(field, value)| (field, value.unwrap_or(f64::NAN)))
                    .collect();
                (type_id, fields)
            })
            .collect();

        Self {
            time: entry.time,
            values,
        }
    }
}

impl SeriesRecord for DataRecord {
    fn time(&self) -> i64 {
        self.time
    }

    fn value_for(&self, type_id: &str, field: &str) -> Option<f64> {
        self.values.get(type_id)?.get(field).copied()
    }
}

/// Time-ordered records and type metadata for one host
///
/// Mutating a dataset does not notify anyone. Owners of caches reading from it
/// must call `AnalysisCache::clear` after adding records.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    hostname: String,
    types: BTreeMap<String, DataType>,
    records: Vec<DataRecord>,
}

impl DataSet {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Load a dataset from a JSON file in the `DataSetFile` schema
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read dataset file {:?}", path))?;

        let file: DataSetFile = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse dataset file {:?}", path))?;

        let dataset = Self::from_file(file);
        info!(
            path = %path.display(),
            hostname = %dataset.hostname,
            types = dataset.types.len(),
            records = dataset.records.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_file(file: DataSetFile) -> Self {
        let mut dataset = Self::new(file.hostname);
        for data_type in file.types {
            dataset.add_type(data_type);
        }

        dataset.records = file.records.into_iter().map(DataRecord::from).collect();
        // Stable sort keeps file order for records sharing a timestamp
        dataset.records.sort_by_key(|r| r.time);
        dataset
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Register a type, replacing any previous definition with the same id
    pub fn add_type(&mut self, data_type: DataType) {
        self.types.insert(data_type.id.clone(), data_type);
    }

    /// Insert a record keeping time order
    pub fn add_record(&mut self, record: DataRecord) {
        let idx = self.records.partition_point(|r| r.time <= record.time);
        debug!(time = record.time, index = idx, "Inserting record");
        self.records.insert(idx, record);
    }

    pub fn types(&self) -> impl Iterator<Item = &DataType> {
        self.types.values()
    }

    pub fn records(&self) -> &[DataRecord] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MetricSeriesSource for DataSet {
    type Record = DataRecord;

    fn start_time(&self) -> i64 {
        self.records.first().map(|r| r.time).unwrap_or(0)
    }

    fn end_time(&self) -> i64 {
        self.records.last().map(|r| r.time).unwrap_or(0)
    }

    fn data_type(&self, type_id: &str) -> Option<&DataType> {
        self.types.get(type_id)
    }

    fn records_in_interval(&self, interval: &Interval) -> &[DataRecord] {
        if interval.is_default() {
            return &self.records;
        }

        let lo = self.records.partition_point(|r| r.time < interval.start());
        let hi = self.records.partition_point(|r| r.time <= interval.end());
        if lo >= hi {
            return &[];
        }
        &self.records[lo..hi]
    }
}
