//! Core data models for the analysis library

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies one trackable series: a metric type and one of its fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataKey {
    pub type_id: String,
    pub field: String,
}

impl DataKey {
    /// Create a key, rejecting empty type or field names
    pub fn new(type_id: impl Into<String>, field: impl Into<String>) -> Result<Self> {
        let type_id = type_id.into();
        let field = field.into();

        if type_id.trim().is_empty() {
            return Err(AnalysisError::InvalidArgument(
                "type must not be empty".to_string(),
            ));
        }
        if field.trim().is_empty() {
            return Err(AnalysisError::InvalidArgument(
                "field must not be empty".to_string(),
            ));
        }

        Ok(Self { type_id, field })
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_id, self.field)
    }
}

/// A metric type collected from a host, e.g. `CPU_ALL` with `User%` and `Sys%`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub fields: Vec<String>,
}

impl DataType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields,
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Keys for every field of this type, in field order
    pub fn keys(&self) -> impl Iterator<Item = DataKey> + '_ {
        self.fields.iter().map(move |field| DataKey {
            type_id: self.id.clone(),
            field: field.clone(),
        })
    }
}

/// On-disk dataset schema produced by the file parsers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSetFile {
    #[serde(default)]
    pub hostname: String,
    pub types: Vec<DataType>,
    pub records: Vec<RecordEntry>,
}

/// One timestamped sample row: `type -> field -> value`
///
/// A `null` value is a sample the collector could not read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Milliseconds since the Unix epoch
    pub time: i64,
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, Option<f64>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_key_rejects_empty_parts() {
        assert!(matches!(
            DataKey::new("", "User%"),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(matches!(
            DataKey::new("CPU_ALL", "  "),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_data_key_ordering_and_display() {
        let a = DataKey::new("CPU_ALL", "Sys%").unwrap();
        let b = DataKey::new("CPU_ALL", "User%").unwrap();
        let c = DataKey::new("MEM", "active").unwrap();

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "CPU_ALL/Sys%");
    }

    #[test]
    fn test_data_type_keys() {
        let cpu = DataType::new(
            "CPU_ALL",
            "CPU Total",
            vec!["User%".to_string(), "Sys%".to_string()],
        );

        let keys: Vec<_> = cpu.keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].field, "User%");
        assert!(cpu.has_field("Sys%"));
        assert!(!cpu.has_field("Wait%"));
    }

    #[test]
    fn test_dataset_file_parsing() {
        let json = r#"{
            "hostname": "db01",
            "types": [{"id": "CPU_ALL", "fields": ["User%"]}],
            "records": [{"time": 1000, "values": {"CPU_ALL": {"User%": 12.5}}}]
        }"#;

        let file: DataSetFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.hostname, "db01");
        assert_eq!(file.types[0].name, "");
        assert_eq!(file.records[0].values["CPU_ALL"]["User%"], Some(12.5));
    }
}
