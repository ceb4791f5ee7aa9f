//! `pstat types`: list the data types of a dataset

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::load_dataset;
use crate::output::{print_info, print_table, OutputFormat};

/// Row for the data types table
#[derive(Tabled, Serialize)]
struct TypeRow {
    #[tabled(rename = "Type")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

pub fn list_types(path: &Path, format: OutputFormat) -> Result<()> {
    let dataset = load_dataset(path)?;

    match format {
        OutputFormat::Json => {
            let types: Vec<_> = dataset.types().collect();
            crate::output::print_json(&types);
        }
        OutputFormat::Table => {
            print_info(&format!(
                "{}: {} records",
                dataset.hostname(),
                dataset.record_count()
            ));

            let rows: Vec<TypeRow> = dataset
                .types()
                .map(|t| TypeRow {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    fields: t.fields.join(", "),
                })
                .collect();
            print_table(&rows, format);
        }
    }

    Ok(())
}
