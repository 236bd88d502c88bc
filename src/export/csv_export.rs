//! CSV export functionality

use std::path::Path;

use csv::Writer;

use crate::models::record::MetricRecord;
use crate::parser::METRIC_COLUMNS;
use crate::CommandError;

/// Write metric rows to CSV with the same columns as the metrics table
pub fn write_records_csv(records: &[MetricRecord], path: &Path) -> Result<(), CommandError> {
    let file = std::fs::File::create(path)
        .map_err(|e| CommandError::Export(format!("Failed to create CSV file: {}", e)))?;

    let mut writer = Writer::from_writer(file);

    if records.is_empty() {
        // serialize() only emits headers alongside the first record
        writer
            .write_record(METRIC_COLUMNS)
            .map_err(|e| CommandError::Export(format!("Failed to write CSV header: {}", e)))?;
    }

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| CommandError::Export(format!("Failed to write CSV record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| CommandError::Export(format!("Failed to flush CSV: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load_metrics;

    #[test]
    fn test_written_csv_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.csv");
        let records = vec![
            MetricRecord::new("2026-01-02", "Google Ads", "Clicks", "12,000", "10,000"),
            MetricRecord::new("2026-01-02", "Email", "Open Rate", "21%", "25%"),
        ];

        write_records_csv(&records, &path).unwrap();

        assert_eq!(load_metrics(&path).unwrap(), records);
    }

    #[test]
    fn test_empty_view_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_records_csv(&[], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "Date,Channel,KPI,Value,Target");
    }
}
