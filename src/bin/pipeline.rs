//! Daily KPI sync: analytics warehouse -> spreadsheet
//!
//! Usage: `kpi-pipeline [credentials.json]`

use kpi_dashboard_lib::config::AppConfig;
use kpi_dashboard_lib::pipeline;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut config = AppConfig::load().pipeline;
    if let Some(path) = std::env::args().nth(1) {
        config.credentials_path = path.into();
    }

    if let Err(e) = pipeline::run_from_config(&config).await {
        tracing::error!("Pipeline error: {}", e);
        std::process::exit(1);
    }
}
