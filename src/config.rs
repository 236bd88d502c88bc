//! Application configuration
//!
//! All settings have defaults matching the fixed values the dashboard and
//! pipeline have always used. An optional JSON file can override any subset.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::kpi::{default_lookups, KpiLookup};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "kpi-dashboard.json";

/// Environment variable overriding the config file path
pub const CONFIG_ENV_VAR: &str = "KPI_DASHBOARD_CONFIG";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid schedule time '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dashboard: DashboardConfig,
    pub pipeline: PipelineConfig,
}

/// Interactive dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub metrics_path: PathBuf,
    pub raw_events_path: PathBuf,
    pub targets: CardTargets,
    pub kpi_lookups: Vec<KpiLookup>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            metrics_path: PathBuf::from("data/processed/dashboard_metrics.csv"),
            raw_events_path: PathBuf::from("data/raw/ga_export.csv"),
            targets: CardTargets::default(),
            kpi_lookups: default_lookups(),
        }
    }
}

/// Benchmarks the headline cards compare against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardTargets {
    pub roas_target: f64,
    pub revenue_benchmark: f64,
    pub cost_budget: f64,
}

impl Default for CardTargets {
    fn default() -> Self {
        Self {
            roas_target: 3.50,
            revenue_benchmark: 150_000.0,
            cost_budget: 45_000.0,
        }
    }
}

/// How the pipeline binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Once,
    Daily,
}

/// Remote fetch pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub credentials_path: PathBuf,
    pub spreadsheet: String,
    pub worksheet: String,
    pub window_days: u32,
    pub events_table: String,
    pub ads_table: String,
    /// Daily trigger time, `HH:MM`, UTC
    pub schedule_at: String,
    pub poll_interval_secs: u64,
    pub run_mode: RunMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("config.json"),
            spreadsheet: "Marketing Analytics Dashboard".to_string(),
            worksheet: "KPIs".to_string(),
            window_days: 30,
            events_table: "project.dataset.events_*".to_string(),
            ads_table: "project.dataset.google_ads".to_string(),
            schedule_at: "06:00".to_string(),
            poll_interval_secs: 60,
            run_mode: RunMode::Once,
        }
    }
}

impl PipelineConfig {
    /// Parse `schedule_at`
    pub fn schedule_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.schedule_at, "%H:%M")
            .map_err(|_| ConfigError::InvalidTime(self.schedule_at.clone()))
    }
}

impl AppConfig {
    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from `$KPI_DASHBOARD_CONFIG` or `kpi-dashboard.json`
    ///
    /// A missing file gives the defaults. A file that cannot be read or parsed
    /// is logged and also gives the defaults.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring config {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
