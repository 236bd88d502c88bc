//! JSON export functionality

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::commands::DashboardResponse;
use crate::CommandError;

/// Current export format version
const EXPORT_VERSION: &str = "1.0";

#[derive(Serialize)]
struct DashboardExportJson<'a> {
    export_date: String,
    export_version: &'static str,
    #[serde(flatten)]
    dashboard: &'a DashboardResponse,
}

/// Write a dashboard snapshot as pretty-printed JSON
pub fn write_dashboard_json(dashboard: &DashboardResponse, path: &Path) -> Result<(), CommandError> {
    let export = DashboardExportJson {
        export_date: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        dashboard,
    };

    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| CommandError::Export(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = std::fs::File::create(path)
        .map_err(|e| CommandError::Export(format!("Failed to create JSON file: {}", e)))?;

    file.write_all(json.as_bytes())
        .map_err(|e| CommandError::Export(format!("Failed to write JSON file: {}", e)))?;

    Ok(())
}
