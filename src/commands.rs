//! Dashboard command handlers
//!
//! Every view of the dashboard is produced by these handlers. They load the
//! datasets through the file cache and recompute all derived data on each
//! call, so a filter change is always a full recomputation from memory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::cache::{get_or_load, FileCache};
use crate::export::{self, ExportFormat};
use crate::metrics::cards::{build_cards, KpiCard};
use crate::metrics::filter::{apply_filter, available_channels, available_dates, DashboardFilter};
use crate::metrics::kpi::summarize_with;
use crate::metrics::projections::{actual_vs_target, channel_clicks};
use crate::models::record::{MetricRecord, RawEventTable};
use crate::models::summary::{ChannelClicks, KpiComparison, KpiSummary};
use crate::parser::{load_metrics, read_raw_events};
use crate::{AppState, CommandError};

// ============================================================================
// Response DTOs
// ============================================================================

/// Selectable filter values
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    /// Most recent first
    pub dates: Vec<String>,
    /// "All" followed by the channels in the data
    pub channels: Vec<String>,
}

/// Everything needed to draw one dashboard view
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub cards: Vec<KpiCard>,
    pub summary: KpiSummary,
    /// Always computed over the unfiltered dataset
    pub channel_clicks: Vec<ChannelClicks>,
    /// Computed over the filtered view
    pub kpi_comparison: Vec<KpiComparison>,
    pub rows: Vec<MetricRecord>,
    pub filter: DashboardFilter,
    pub options: FilterOptions,
    pub total_rows: usize,
    pub raw_event_rows: Option<usize>,
    pub last_updated: String,
}

// ============================================================================
// Dataset Cache
// ============================================================================

lazy_static::lazy_static! {
    static ref METRICS_CACHE: RwLock<FileCache<Vec<MetricRecord>>> = RwLock::new(FileCache::new());
    static ref RAW_EVENTS_CACHE: RwLock<FileCache<RawEventTable>> = RwLock::new(FileCache::new());
}

/// Load the metrics table through the cache
fn load_metrics_cached(path: &Path) -> Result<Arc<Vec<MetricRecord>>, CommandError> {
    Ok(get_or_load(&*METRICS_CACHE, path, load_metrics)?)
}

/// Load the raw event export through the cache
///
/// Absent files are silent; unreadable ones are logged and skipped.
fn load_raw_events_cached(path: &Path) -> Option<Arc<RawEventTable>> {
    if !path.exists() {
        return None;
    }
    match get_or_load(&*RAW_EVENTS_CACHE, path, read_raw_events) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!("Could not load raw event data: {}", e);
            None
        }
    }
}

/// Drop all cached datasets, returning how many entries were cleared
pub fn refresh_data() -> usize {
    let mut cleared = 0;
    if let Ok(mut cache) = METRICS_CACHE.write() {
        cleared += cache.len();
        cache.clear();
    }
    if let Ok(mut cache) = RAW_EVENTS_CACHE.write() {
        cleared += cache.len();
        cache.clear();
    }
    cleared
}

// ============================================================================
// Commands
// ============================================================================

/// Load the metrics table, rejecting an empty one
pub fn load_dataset(state: &AppState) -> Result<Arc<Vec<MetricRecord>>, CommandError> {
    let records = load_metrics_cached(&state.config.dashboard.metrics_path)?;
    if records.is_empty() {
        return Err(CommandError::EmptyDataset);
    }
    Ok(records)
}

/// Default selection: most recent date, all channels
pub fn get_default_filter(state: &AppState) -> Result<DashboardFilter, CommandError> {
    let records = load_dataset(state)?;
    Ok(DashboardFilter::default_for(&records))
}

/// Build the dashboard for a filter (or the default filter)
pub fn get_dashboard(
    state: &AppState,
    filter: Option<DashboardFilter>,
) -> Result<DashboardResponse, CommandError> {
    let records = load_dataset(state)?;
    let raw_event_rows = load_raw_events_cached(&state.config.dashboard.raw_events_path).map(|t| t.len());
    let filter = filter.unwrap_or_else(|| DashboardFilter::default_for(&records));

    Ok(build_dashboard(&records, &filter, state, raw_event_rows))
}

/// Compute a dashboard view from an in-memory dataset
pub fn build_dashboard(
    records: &[MetricRecord],
    filter: &DashboardFilter,
    state: &AppState,
    raw_event_rows: Option<usize>,
) -> DashboardResponse {
    let dashboard = &state.config.dashboard;

    let summary = summarize_with(records, &dashboard.kpi_lookups);
    let cards = build_cards(&summary, &dashboard.targets);
    let view = apply_filter(records, filter);

    DashboardResponse {
        cards,
        channel_clicks: channel_clicks(records),
        kpi_comparison: actual_vs_target(view.iter().copied()),
        rows: view.into_iter().cloned().collect(),
        summary,
        filter: filter.clone(),
        options: FilterOptions {
            dates: available_dates(records),
            channels: available_channels(records),
        },
        total_rows: records.len(),
        raw_event_rows,
        last_updated: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// First `limit` rows of the raw event export, if it exists
pub fn get_raw_events(state: &AppState, limit: usize) -> Option<RawEventTable> {
    load_raw_events_cached(&state.config.dashboard.raw_events_path).map(|t| t.head(limit))
}

/// Export the current view
///
/// CSV writes the filtered rows; JSON writes the whole dashboard response.
/// Returns the path of the written file.
pub fn export_view(
    state: &AppState,
    filter: &DashboardFilter,
    format: &str,
    directory: Option<PathBuf>,
) -> Result<PathBuf, CommandError> {
    let format: ExportFormat = format.parse()?;
    let dashboard = get_dashboard(state, Some(filter.clone()))?;

    let directory = directory.unwrap_or_else(export::get_export_directory);
    let path = directory.join(export::generate_export_filename("kpi_dashboard", format.extension()));

    match format {
        ExportFormat::Csv => export::write_records_csv(&dashboard.rows, &path)?,
        ExportFormat::Json => export::write_dashboard_json(&dashboard, &path)?,
    }

    tracing::info!("Exported {} rows to {:?}", dashboard.rows.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::metrics::filter::ChannelFilter;

    const METRICS_CSV: &str = "Date,Channel,KPI,Value,Target\n\
        2026-01-01,Overall,ROAS,4.10,3.50\n\
        2026-01-01,Overall,Total Revenue,\"140,000\",\"150,000\"\n\
        2026-01-02,Overall,ROAS,4.25,3.50\n\
        2026-01-02,Overall,Total Revenue,\"$150,000\",\"150,000\"\n\
        2026-01-02,Overall,Total Cost,\"35,000\",\"45,000\"\n\
        2026-01-02,Google Ads,Clicks,\"12,000\",\"10,000\"\n\
        2026-01-02,Google Ads,Conversions,320,300\n\
        2026-01-02,Facebook,Clicks,\"8,000\",n/a\n\
        2026-01-02,Organic,Sessions,\"45,000\",\"40,000\"\n\
        2026-01-02,Email,Open Rate,21%,25%\n";

    fn state_with(dir: &tempfile::TempDir, metrics: Option<&str>) -> AppState {
        let mut config = AppConfig::default();
        config.dashboard.metrics_path = dir.path().join("dashboard_metrics.csv");
        config.dashboard.raw_events_path = dir.path().join("ga_export.csv");
        if let Some(contents) = metrics {
            std::fs::write(&config.dashboard.metrics_path, contents).unwrap();
        }
        AppState::new(config)
    }

    #[test]
    fn test_missing_metrics_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, None);

        let err = get_dashboard(&state, None).unwrap_err();
        assert!(matches!(err, CommandError::MissingFile(_)));
    }

    #[test]
    fn test_empty_metrics_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some("Date,Channel,KPI,Value,Target\n"));

        assert!(matches!(get_dashboard(&state, None), Err(CommandError::EmptyDataset)));
    }

    #[test]
    fn test_default_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));

        let dashboard = get_dashboard(&state, None).unwrap();

        assert_eq!(dashboard.filter.date.as_deref(), Some("2026-01-02"));
        assert_eq!(dashboard.options.dates, vec!["2026-01-02", "2026-01-01"]);
        assert_eq!(dashboard.options.channels[0], "All");
        assert_eq!(dashboard.total_rows, 10);
        assert_eq!(dashboard.rows.len(), 8);
        assert_eq!(dashboard.raw_event_rows, None);

        // First occurrence wins for the summary, across all dates
        assert_eq!(dashboard.summary.get("ROAS"), Some(4.10));
        assert_eq!(dashboard.summary.get("Total Revenue"), Some(140000.0));
        assert_eq!(dashboard.summary.duplicates.len(), 2);

        assert_eq!(dashboard.cards[3].value, "20,000");

        // Facebook's target does not parse, so its row is dropped from the comparison
        assert_eq!(dashboard.kpi_comparison.len(), 7);
        assert!(dashboard.kpi_comparison.iter().all(|p| p.channel != "Facebook"));
    }

    #[test]
    fn test_channel_clicks_ignore_filter() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));

        let filter = DashboardFilter {
            date: Some("2026-01-01".to_string()),
            channel: ChannelFilter::from("Overall"),
        };
        let dashboard = get_dashboard(&state, Some(filter)).unwrap();

        assert_eq!(dashboard.rows.len(), 2);
        assert_eq!(dashboard.channel_clicks.len(), 2);
        assert_eq!(dashboard.channel_clicks[0].channel, "Google Ads");
        assert_eq!(dashboard.channel_clicks[1].clicks, 8000.0);
    }

    #[test]
    fn test_unknown_date_gives_empty_view() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));

        let filter = DashboardFilter {
            date: Some("2020-01-01".to_string()),
            channel: ChannelFilter::All,
        };
        let dashboard = get_dashboard(&state, Some(filter)).unwrap();

        assert!(dashboard.rows.is_empty());
        assert!(dashboard.kpi_comparison.is_empty());
        assert_eq!(dashboard.cards.len(), 4);
    }

    #[test]
    fn test_raw_events_optional() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));
        assert!(get_raw_events(&state, 5).is_none());

        std::fs::write(
            &state.config.dashboard.raw_events_path,
            "date,users\n2026-01-01,10\n2026-01-02,12\n",
        )
        .unwrap();
        let table = get_raw_events(&state, 1).unwrap();
        assert_eq!(table.len(), 1);

        let dashboard = get_dashboard(&state, None).unwrap();
        assert_eq!(dashboard.raw_event_rows, Some(2));
    }

    #[test]
    fn test_short_row_still_renders_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(
            &dir,
            Some(
                "Date,Channel,KPI,Value,Target\n\
                 2026-01-02,Overall,ROAS,4.25,3.50\n\
                 2026-01-02,Organic,Sessions,45000\n",
            ),
        );

        let dashboard = get_dashboard(&state, None).unwrap();
        assert_eq!(dashboard.summary.get("ROAS"), Some(4.25));
        assert_eq!(dashboard.summary.get("Organic Sessions"), Some(45000.0));
        assert_eq!(dashboard.rows.len(), 2);
        // The row without a target has nothing to compare against
        assert_eq!(dashboard.kpi_comparison.len(), 1);
    }

    #[test]
    fn test_unreadable_raw_events_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));
        std::fs::write(&state.config.dashboard.raw_events_path, [0xff, 0xfe, b',', b'\n']).unwrap();

        assert!(get_raw_events(&state, 5).is_none());
        let dashboard = get_dashboard(&state, None).unwrap();
        assert_eq!(dashboard.raw_event_rows, None);
    }

    #[test]
    fn test_dataset_reloads_after_file_change() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));
        assert_eq!(load_dataset(&state).unwrap().len(), 10);

        std::fs::write(
            &state.config.dashboard.metrics_path,
            "Date,Channel,KPI,Value,Target\n2026-02-01,Overall,ROAS,5.0,3.5\n",
        )
        .unwrap();
        assert_eq!(load_dataset(&state).unwrap().len(), 1);
    }

    #[test]
    fn test_export_view_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(METRICS_CSV));
        let filter = DashboardFilter {
            date: Some("2026-01-01".to_string()),
            channel: ChannelFilter::All,
        };

        let csv_path = export_view(&state, &filter, "csv", Some(dir.path().to_path_buf())).unwrap();
        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(contents.starts_with("Date,Channel,KPI,Value,Target"));
        assert_eq!(contents.lines().count(), 3);

        let json_path = export_view(&state, &filter, "json", Some(dir.path().to_path_buf())).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);

        assert!(export_view(&state, &filter, "xml", None).is_err());
    }
}
