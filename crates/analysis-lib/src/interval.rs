//! Time windows used to scope statistics
//!
//! An interval is a value type: equality, ordering and hashing consider only
//! `start` and `end`. The name is a display label that may be changed freely.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A time window `[start, end]` in milliseconds since the Unix epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    start: i64,
    end: i64,
    #[serde(default)]
    name: String,
}

impl Interval {
    /// Sentinel meaning "all available data"
    ///
    /// Its bounds are placeholders. Consumers must resolve the real bounds
    /// from the series source instead of doing arithmetic on them.
    pub const DEFAULT: Interval = Interval {
        start: 0,
        end: i64::MAX,
        name: String::new(),
    };

    /// Create an unnamed interval, failing when `start >= end`
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start >= end {
            return Err(AnalysisError::InvalidRange { start, end });
        }

        Ok(Self {
            start,
            end,
            name: String::new(),
        })
    }

    /// Create a named interval
    pub fn named(start: i64, end: i64, name: impl Into<String>) -> Result<Self> {
        let mut interval = Self::new(start, end)?;
        interval.name = name.into();
        Ok(interval)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Length of the window in milliseconds
    ///
    /// Unsigned so that the full `i64` range has a representable length.
    pub fn duration(&self) -> u64 {
        (self.end as i128 - self.start as i128) as u64
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// Whether `time` falls inside the window, both ends inclusive
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time <= self.end
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for Interval {}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return write!(f, "All Data");
        }
        if !self.name.is_empty() {
            return write!(f, "{}", self.name);
        }

        write!(
            f,
            "{} - {}",
            format_millis(self.start, "%Y-%m-%d %H:%M:%S"),
            format_millis(self.end, "%H:%M:%S")
        )
    }
}

fn format_millis(millis: i64, pattern: &str) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rejects_empty_or_inverted_range() {
        assert_eq!(
            Interval::new(10, 10),
            Err(AnalysisError::InvalidRange { start: 10, end: 10 })
        );
        assert!(Interval::new(20, 10).is_err());
        assert!(Interval::new(10, 11).is_ok());
    }

    #[test]
    fn test_duration() {
        let interval = Interval::new(1_000, 61_000).unwrap();
        assert_eq!(interval.duration(), 60_000);
    }

    #[test]
    fn test_duration_of_full_range() {
        let interval = Interval::new(i64::MIN, i64::MAX).unwrap();
        assert_eq!(interval.duration(), u64::MAX);
        assert_eq!(Interval::DEFAULT.duration(), i64::MAX as u64);
    }

    #[test]
    fn test_name_not_part_of_identity() {
        let a = Interval::named(0, 100, "warmup").unwrap();
        let b = Interval::named(0, 100, "steady state").unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_ordering_by_start_then_end() {
        let mut intervals = vec![
            Interval::new(50, 60).unwrap(),
            Interval::new(0, 100).unwrap(),
            Interval::new(0, 40).unwrap(),
        ];
        intervals.sort();

        assert_eq!(intervals[0], Interval::new(0, 40).unwrap());
        assert_eq!(intervals[1], Interval::new(0, 100).unwrap());
        assert_eq!(intervals[2], Interval::new(50, 60).unwrap());
    }

    #[test]
    fn test_default_sentinel() {
        assert!(Interval::DEFAULT.is_default());
        assert!(Interval::default().is_default());
        assert!(!Interval::new(0, 100).unwrap().is_default());
        assert_eq!(Interval::DEFAULT.to_string(), "All Data");
    }

    #[test]
    fn test_display() {
        let named = Interval::named(0, 60_000, "peak hour").unwrap();
        assert_eq!(named.to_string(), "peak hour");

        let unnamed = Interval::new(0, 60_000).unwrap();
        assert_eq!(unnamed.to_string(), "1970-01-01 00:00:00 - 00:01:00");
    }

    #[test]
    fn test_contains_is_inclusive() {
        let interval = Interval::new(100, 200).unwrap();
        assert!(interval.contains(100));
        assert!(interval.contains(200));
        assert!(!interval.contains(201));
    }
}
