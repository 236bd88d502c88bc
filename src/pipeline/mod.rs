//! KPI sync pipeline
//!
//! Fetches the trailing window of analytics and ads data, reduces it to six
//! headline KPIs and writes them into fixed cells of a spreadsheet. Runs once
//! or on a daily trigger; a failed run is logged and otherwise ignored.

pub mod google;
pub mod kpis;
pub mod sheets;
pub mod sources;

pub use kpis::{calculate_kpis, PipelineKpis};
pub use sheets::{sheet_updates, CellValue, SheetWriter, SHEET_LAYOUT};
pub use sources::{AdsDailyRow, AnalyticsSource, GaDailyRow};

use std::time::Duration;

use crate::config::{PipelineConfig, RunMode};
use crate::scheduler::{self, DailyTrigger};

/// Errors from fetching, computing or writing pipeline data
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// One fetch -> aggregate -> write pass over a source and a sheet
pub struct Pipeline<S, W> {
    source: S,
    writer: W,
}

impl<S: AnalyticsSource, W: SheetWriter> Pipeline<S, W> {
    pub fn new(source: S, writer: W) -> Self {
        Self { source, writer }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Run the pipeline, returning the KPIs that were written
    pub async fn try_run(&self) -> Result<PipelineKpis, PipelineError> {
        self.source.initialize().await?;
        self.writer.initialize().await?;

        let ga = self.source.fetch_ga4_data().await?;
        tracing::info!("Fetched {} days of GA4 data", ga.len());

        let ads = self.source.fetch_ads_data().await?;
        tracing::info!("Fetched Ads data for {} campaigns", kpis::campaign_count(&ads));

        let kpis = calculate_kpis(&ga, &ads);
        tracing::info!("Calculated KPIs:");
        for (cell, field) in SHEET_LAYOUT {
            tracing::info!("  {:?} ({}): {}", field, cell, field.value(&kpis));
        }

        update_dashboard(&self.writer, &kpis).await?;
        Ok(kpis)
    }

    /// Run the pipeline and log the outcome; errors end the run quietly
    pub async fn run(&self) -> Option<PipelineKpis> {
        tracing::info!("{}", "=".repeat(50));
        tracing::info!("Pipeline started at {}", chrono::Utc::now().to_rfc3339());
        tracing::info!("{}", "=".repeat(50));

        match self.try_run().await {
            Ok(kpis) => {
                tracing::info!("Pipeline completed successfully");
                Some(kpis)
            }
            Err(e) => {
                tracing::error!("Pipeline error: {}", e);
                None
            }
        }
    }
}

/// Write each KPI cell in layout order, stopping at the first failure
pub async fn update_dashboard<W: SheetWriter + ?Sized>(
    writer: &W,
    kpis: &PipelineKpis,
) -> Result<(), PipelineError> {
    for (cell, value) in sheet_updates(kpis) {
        writer.update_cell(cell, value).await?;
    }
    tracing::info!("Dashboard updated successfully");
    Ok(())
}

/// Build the Google-backed pipeline and run it as configured
pub async fn run_from_config(config: &PipelineConfig) -> Result<(), PipelineError> {
    let session = google::GoogleSession::new(config.credentials_path.clone());
    let pipeline = Pipeline::new(
        google::BigQuerySource::new(session.clone(), config),
        google::GoogleSheetWriter::new(session, config),
    );

    match config.run_mode {
        RunMode::Once => {
            pipeline.run().await;
        }
        RunMode::Daily => {
            let at = config.schedule_time()?;
            let trigger = DailyTrigger::new(at, chrono::Utc::now().naive_utc());
            tracing::info!("Daily updates scheduled for {} UTC", at.format("%H:%M"));
            scheduler::run_daily(&pipeline, trigger, Duration::from_secs(config.poll_interval_secs)).await;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory source and writer for pipeline tests

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[derive(Default)]
    pub struct FakeSource {
        pub ga: Vec<GaDailyRow>,
        pub ads: Vec<AdsDailyRow>,
        pub fail_ads: bool,
        pub fetches: AtomicUsize,
    }

    #[async_trait]
    impl AnalyticsSource for FakeSource {
        async fn fetch_ga4_data(&self) -> Result<Vec<GaDailyRow>, PipelineError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.ga.clone())
        }

        async fn fetch_ads_data(&self) -> Result<Vec<AdsDailyRow>, PipelineError> {
            if self.fail_ads {
                return Err(PipelineError::Api {
                    status: 403,
                    message: "access denied".to_string(),
                });
            }
            Ok(self.ads.clone())
        }
    }

    #[derive(Default)]
    pub struct RecordingWriter {
        pub cells: Mutex<Vec<(String, CellValue)>>,
        pub fail_on: Option<&'static str>,
    }

    impl RecordingWriter {
        pub fn written(&self) -> Vec<(String, CellValue)> {
            self.cells.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SheetWriter for RecordingWriter {
        async fn update_cell(&self, cell: &str, value: CellValue) -> Result<(), PipelineError> {
            if self.fail_on == Some(cell) {
                return Err(PipelineError::Api {
                    status: 500,
                    message: format!("cannot write {}", cell),
                });
            }
            self.cells.lock().unwrap().push((cell.to_string(), value));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn sample_source() -> FakeSource {
        FakeSource {
            ga: vec![
                GaDailyRow {
                    date: day(2),
                    users: 120,
                    sessions: 300,
                    avg_session_duration: 80.0,
                    conversion_rate: 3.0,
                },
                GaDailyRow {
                    date: day(1),
                    users: 80,
                    sessions: 200,
                    avg_session_duration: 60.0,
                    conversion_rate: 2.0,
                },
            ],
            ads: vec![
                AdsDailyRow {
                    date: day(2),
                    campaign_name: "Brand".to_string(),
                    impressions: 1000,
                    clicks: 100,
                    cost: 150.0,
                    conversions: 6.0,
                    cpa: Some(25.0),
                },
                AdsDailyRow {
                    date: day(1),
                    campaign_name: "Brand".to_string(),
                    impressions: 900,
                    clicks: 90,
                    cost: 50.0,
                    conversions: 0.0,
                    cpa: None,
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_try_run_writes_all_cells_in_order() {
        let pipeline = Pipeline::new(sample_source(), RecordingWriter::default());
        let kpis = pipeline.try_run().await.unwrap();

        assert_eq!(kpis.total_users, 200);
        assert_eq!(kpis.total_sessions, 500);
        assert_eq!(kpis.avg_conversion_rate, 2.5);
        assert_eq!(kpis.avg_cpa, 25.0);
        assert_eq!(kpis.total_spend, 200.0);
        assert_eq!(kpis.roas, 3.0);

        let written = pipeline.writer().written();
        let cells: Vec<&str> = written.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(cells, vec!["B2", "B3", "B4", "B5", "B6", "B7"]);
        assert_eq!(written[0].1, CellValue::Integer(200));
        assert_eq!(written[5].1, CellValue::Number(3.0));
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let source = FakeSource {
            fail_ads: true,
            ..sample_source()
        };
        let pipeline = Pipeline::new(source, RecordingWriter::default());

        assert!(matches!(pipeline.try_run().await, Err(PipelineError::Api { status: 403, .. })));
        assert!(pipeline.writer().written().is_empty());

        // run() swallows the error
        assert_eq!(pipeline.run().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_partial_sheet() {
        let writer = RecordingWriter {
            fail_on: Some("B4"),
            ..Default::default()
        };
        let pipeline = Pipeline::new(sample_source(), writer);

        assert!(pipeline.run().await.is_none());
        let cells: Vec<String> = pipeline.writer().written().into_iter().map(|(c, _)| c).collect();
        assert_eq!(cells, vec!["B2", "B3"]);
    }

    #[tokio::test]
    async fn test_empty_sources_write_zeros() {
        let pipeline = Pipeline::new(FakeSource::default(), RecordingWriter::default());
        let kpis = pipeline.run().await.unwrap();

        assert_eq!(kpis, PipelineKpis::default());
        assert_eq!(pipeline.writer().written().len(), SHEET_LAYOUT.len());
    }
}
