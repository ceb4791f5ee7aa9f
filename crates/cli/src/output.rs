//! Output formatting utilities

use analysis_lib::Statistic;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print a table whose columns are only known at runtime
pub fn print_grid(header: Vec<String>, rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }

    let table = builder.build().with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a statistic value; `NaN` means no data
pub fn format_value(stat: Statistic, value: f64) -> String {
    if value.is_nan() {
        return "N/A".dimmed().to_string();
    }

    match stat {
        // Aggregates over counts (e.g. a median) can be fractional
        Statistic::Count if value.fract() == 0.0 => format!("{}", value as i64),
        _ => format!("{:.2}", value),
    }
}

/// Format epoch milliseconds as a UTC timestamp
pub fn format_time(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        colored::control::set_override(false);
        assert_eq!(format_value(Statistic::Average, 12.345), "12.35");
        assert_eq!(format_value(Statistic::Count, 5.0), "5");
        assert_eq!(format_value(Statistic::Count, 2.5), "2.50");
        assert_eq!(format_value(Statistic::Median, f64::NAN), "N/A");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00");
        assert_eq!(format_time(90_000), "1970-01-01 00:01:30");
    }
}
