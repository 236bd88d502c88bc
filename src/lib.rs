//! Marketing KPI Dashboard - Backend
//!
//! This library provides the Rust backend for the marketing KPI dashboard.
//! It handles:
//! - Loading the metrics table and the optional raw event export
//! - KPI summary extraction and chart projections
//! - Date/channel filtering and dataset caching
//! - CSV/JSON export of the current view
//! - The scheduled pipeline that syncs analytics/ads KPIs to a spreadsheet

pub mod cache;
pub mod commands;
pub mod config;
pub mod export;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod scheduler;

use std::io::{BufRead, Write};

use config::AppConfig;
use metrics::filter::{ChannelFilter, DashboardFilter};

/// Steps shown when the metrics table cannot be loaded
pub const TROUBLESHOOTING: &str = "Troubleshooting:\n\
    1. Ensure data/processed/dashboard_metrics.csv exists\n\
    2. Check that the file path is correct\n\
    3. Verify the file has Date, Channel, KPI, Value and Target columns";

/// Application state shared by command handlers
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

/// Error type for dashboard commands
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Data file not found: {0}")]
    MissingFile(String),

    #[error("Unable to load dashboard data: the metrics table is empty")]
    EmptyDataset,

    #[error("Load error: {0}")]
    Load(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<parser::LoadError> for CommandError {
    fn from(err: parser::LoadError) -> Self {
        match err {
            parser::LoadError::MissingFile(path) => CommandError::MissingFile(path.display().to_string()),
            other => CommandError::Load(other.to_string()),
        }
    }
}

// Serialized as the display string for frontends
impl serde::Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

// ============================================================================
// Interactive Dashboard
// ============================================================================

/// A line command typed at the dashboard prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Date(String),
    Channel(ChannelFilter),
    Refresh,
    Raw(usize),
    Export(String),
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        let command = match (verb, arg) {
            ("date", d) if !d.is_empty() => Command::Date(d.to_string()),
            ("channel", c) if !c.is_empty() => Command::Channel(ChannelFilter::from(c)),
            ("refresh", _) => Command::Refresh,
            ("raw", "") => Command::Raw(5),
            ("raw", n) => match n.parse() {
                Ok(n) => Command::Raw(n),
                Err(_) => Command::Unknown(line.to_string()),
            },
            ("export", f) if !f.is_empty() => Command::Export(f.to_string()),
            ("help", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Run the interactive dashboard on stdin/stdout
pub fn run() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting marketing KPI dashboard");

    let state = AppState::new(AppConfig::load());

    let mut filter = match commands::get_default_filter(&state) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}\n\n{}", e, TROUBLESHOOTING);
            return;
        }
    };

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    show_dashboard(&state, &filter, &mut stdout);
    print_prompt(&mut stdout);

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(command) = Command::parse(&line) else {
            print_prompt(&mut stdout);
            continue;
        };

        match command {
            Command::Date(date) => {
                filter.date = Some(date);
                show_dashboard(&state, &filter, &mut stdout);
            }
            Command::Channel(channel) => {
                filter.channel = channel;
                show_dashboard(&state, &filter, &mut stdout);
            }
            Command::Refresh => {
                let cleared = commands::refresh_data();
                tracing::info!("Cleared {} cached datasets", cleared);
                show_dashboard(&state, &filter, &mut stdout);
            }
            Command::Raw(limit) => match commands::get_raw_events(&state, limit) {
                Some(table) => {
                    let _ = writeln!(stdout, "{}", render::render_raw_events(&table));
                }
                None => {
                    let _ = writeln!(stdout, "No raw event data available.");
                }
            },
            Command::Export(format) => match commands::export_view(&state, &filter, &format, None) {
                Ok(path) => {
                    let _ = writeln!(stdout, "Exported to {}", path.display());
                }
                Err(e) => {
                    tracing::error!("Export failed: {}", e);
                }
            },
            Command::Help => {
                let _ = writeln!(stdout, "{}", render::HELP);
            }
            Command::Quit => break,
            Command::Unknown(text) => {
                let _ = writeln!(stdout, "Unknown command: {} (type 'help')", text);
            }
        }
        print_prompt(&mut stdout);
    }
}

fn show_dashboard(state: &AppState, filter: &DashboardFilter, out: &mut impl Write) {
    match commands::get_dashboard(state, Some(filter.clone())) {
        Ok(dashboard) => {
            let _ = writeln!(out, "{}", render::render_dashboard(&dashboard));
        }
        Err(e) => {
            tracing::error!("{}", e);
            let _ = writeln!(out, "{}\n\n{}", e, TROUBLESHOOTING);
        }
    }
}

fn print_prompt(out: &mut impl Write) {
    let _ = write!(out, "> ");
    let _ = out.flush();
}
