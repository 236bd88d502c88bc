//! CSV readers for the metrics table and the raw event export

use std::path::Path;

use csv::ReaderBuilder;

use super::{LoadError, LoadResult};
use crate::models::record::{MetricRecord, RawEventTable};

/// Columns the metrics table must have
pub const METRIC_COLUMNS: [&str; 5] = ["Date", "Channel", "KPI", "Value", "Target"];

/// Load the metrics table
///
/// The file is required: a missing path is reported as `LoadError::MissingFile`
/// rather than an IO error so callers can show a specific diagnostic. Every
/// column must be in the header, but a row may stop early; its trailing
/// fields read as empty strings.
pub fn load_metrics(path: &Path) -> LoadResult<Vec<MetricRecord>> {
    if !path.exists() {
        return Err(LoadError::MissingFile(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if let Some(missing) = METRIC_COLUMNS.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(LoadError::MissingColumn(missing.to_string()));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let mut row = row?;
        while row.len() < headers.len() {
            row.push_field("");
        }
        records.push(row.deserialize::<MetricRecord>(Some(&headers))?);
    }

    tracing::debug!("Loaded {} metric rows from {:?}", records.len(), path);
    Ok(records)
}

/// Read the raw event export, failing on any error
pub fn read_raw_events(path: &Path) -> LoadResult<RawEventTable> {
    if !path.exists() {
        return Err(LoadError::MissingFile(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    Ok(RawEventTable { headers, rows })
}
