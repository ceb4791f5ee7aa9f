//! Performance analyzer service
//!
//! Serves statistics for one loaded dataset over HTTP, together with the
//! interval, granularity and tracked-field controls that scope them.

pub mod api;
pub mod config;
pub mod state;
