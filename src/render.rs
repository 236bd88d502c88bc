//! Plain-text rendering of dashboard views
//!
//! Produces the terminal version of the dashboard: headline cards, the two
//! bar charts and the detailed metrics table.

use std::fmt::Write;

use crate::commands::DashboardResponse;
use crate::metrics::cards::format_thousands;
use crate::models::record::RawEventTable;

/// Width of the longest bar in a chart
const BAR_WIDTH: usize = 40;

pub const HELP: &str = "Commands:\n\
    \x20 date <YYYY-MM-DD>    show a single date\n\
    \x20 channel <name|All>   show a single channel\n\
    \x20 refresh              reload data files\n\
    \x20 raw [n]              preview the raw event export\n\
    \x20 export csv|json      export the current view\n\
    \x20 help                 show this help\n\
    \x20 quit                 exit";

/// Scale `value` to a bar of at most `BAR_WIDTH` characters
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.clamp(1, BAR_WIDTH))
}

fn rule(out: &mut String) {
    let _ = writeln!(out, "{}", "-".repeat(72));
}

/// Render a full dashboard view
pub fn render_dashboard(dashboard: &DashboardResponse) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Marketing Analytics Dashboard");
    let _ = writeln!(
        out,
        "Date: {}   Channel: {}",
        dashboard.filter.date.as_deref().unwrap_or("(all)"),
        String::from(dashboard.filter.channel.clone())
    );
    rule(&mut out);

    // KPI cards
    for card in &dashboard.cards {
        match &card.delta {
            Some(delta) => {
                let _ = writeln!(out, "{:<16}{:>14}   ({})", card.label, card.value, delta);
            }
            None => {
                let _ = writeln!(out, "{:<16}{:>14}", card.label, card.value);
            }
        }
    }
    for dup in &dashboard.summary.duplicates {
        let _ = writeln!(
            out,
            "warning: {} / {} appears {} times, showing the first",
            dup.channel, dup.kpi, dup.occurrences
        );
    }
    rule(&mut out);

    // Clicks by channel
    let _ = writeln!(out, "Clicks by Channel");
    if dashboard.channel_clicks.is_empty() {
        let _ = writeln!(out, "  No channel click data available to display.");
    } else {
        let max = dashboard.channel_clicks.iter().map(|c| c.clicks).fold(0.0, f64::max);
        for point in &dashboard.channel_clicks {
            let _ = writeln!(
                out,
                "  {:<14}{:>10} {}",
                point.channel,
                format_thousands(point.clicks),
                bar(point.clicks, max)
            );
        }
    }
    rule(&mut out);

    // Actual vs target
    let _ = writeln!(out, "Actual vs Target KPIs");
    if dashboard.kpi_comparison.is_empty() {
        let _ = writeln!(out, "  No KPI data available to display.");
    } else {
        for point in &dashboard.kpi_comparison {
            let _ = writeln!(
                out,
                "  {:<14}{:<20}{:>12.2} / {:<12.2}",
                point.channel, point.kpi, point.value, point.target
            );
        }
    }
    rule(&mut out);

    // Detailed metrics
    let _ = writeln!(out, "Detailed Metrics ({} of {} rows)", dashboard.rows.len(), dashboard.total_rows);
    let _ = writeln!(out, "  {:<12}{:<14}{:<20}{:>12}{:>12}", "Date", "Channel", "KPI", "Value", "Target");
    for row in &dashboard.rows {
        let _ = writeln!(
            out,
            "  {:<12}{:<14}{:<20}{:>12}{:>12}",
            row.date, row.channel, row.kpi, row.value, row.target
        );
    }
    rule(&mut out);

    let _ = write!(out, "Last Updated: {}", dashboard.last_updated);
    out
}

/// Render a raw event preview
pub fn render_raw_events(table: &RawEventTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", table.headers.join(" | "));
    for row in &table.rows {
        let _ = writeln!(out, "{}", row.join(" | "));
    }
    let _ = write!(out, "({} rows)", table.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_dashboard;
    use crate::metrics::filter::DashboardFilter;
    use crate::models::record::MetricRecord;
    use crate::AppState;

    #[test]
    fn test_bar() {
        assert_eq!(bar(10.0, 10.0).len(), BAR_WIDTH);
        assert_eq!(bar(5.0, 10.0).len(), BAR_WIDTH / 2);
        assert_eq!(bar(0.001, 10.0).len(), 1);
        assert_eq!(bar(0.0, 10.0), "");
        assert_eq!(bar(5.0, 0.0), "");
    }

    #[test]
    fn test_render_dashboard_sections() {
        let records = vec![
            MetricRecord::new("2026-01-02", "Overall", "ROAS", "4.25", "3.50"),
            MetricRecord::new("2026-01-02", "Google Ads", "Clicks", "12,000", "10,000"),
        ];
        let filter = DashboardFilter::default_for(&records);
        let dashboard = build_dashboard(&records, &filter, &AppState::default(), None);

        let text = render_dashboard(&dashboard);
        assert!(text.contains("Date: 2026-01-02   Channel: All"));
        assert!(text.contains("ROAS"));
        assert!(text.contains("4.25"));
        assert!(text.contains("12,000"));
        assert!(text.contains("Detailed Metrics (2 of 2 rows)"));
        assert!(text.contains("Last Updated:"));
    }

    #[test]
    fn test_render_empty_charts() {
        let records = vec![MetricRecord::new("2026-01-02", "Organic", "Sessions", "n/a", "n/a")];
        let filter = DashboardFilter::default_for(&records);
        let dashboard = build_dashboard(&records, &filter, &AppState::default(), None);

        let text = render_dashboard(&dashboard);
        assert!(text.contains("No channel click data available to display."));
        assert!(text.contains("No KPI data available to display."));
    }

    #[test]
    fn test_render_raw_events() {
        let table = RawEventTable {
            headers: vec!["date".to_string(), "users".to_string()],
            rows: vec![vec!["2026-01-01".to_string(), "10".to_string()]],
        };
        assert_eq!(render_raw_events(&table), "date | users\n2026-01-01 | 10\n(1 rows)");
    }
}
