//! Metrics store reader
//!
//! This module handles reading the persisted dashboard inputs:
//! - The required metrics table (Date, Channel, KPI, Value, Target)
//! - The optional raw event export
//! - Lenient numeric parsing of value strings

pub mod csv_reader;
pub mod lenient;

use std::path::PathBuf;

use thiserror::Error;

pub use csv_reader::{load_metrics, read_raw_events, METRIC_COLUMNS};
pub use lenient::{extract, parse_lenient, LenientValue};

/// Loader errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Data file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for loader operations
pub type LoadResult<T> = Result<T, LoadError>;
