//! KPI cards shown at the top of the dashboard

use serde::Serialize;

use crate::config::CardTargets;
use crate::models::summary::KpiSummary;

/// A single headline card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: String,
    pub value: String,
    pub delta: Option<String>,
    /// Lower is better for this card (cost)
    pub inverse: bool,
}

/// Format a number rounded to whole units with thousands separators
pub fn format_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 && digits != "0" {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format as whole dollars, e.g. `$150,000` or `$-5,000`
pub fn format_currency(value: f64) -> String {
    format!("${}", format_thousands(value))
}

/// Build the four headline cards: ROAS, revenue, cost, clicks
pub fn build_cards(summary: &KpiSummary, targets: &CardTargets) -> Vec<KpiCard> {
    let roas = summary.get_or_zero("ROAS");
    let revenue = summary.get_or_zero("Total Revenue");
    let cost = summary.get_or_zero("Total Cost");
    let clicks = summary.get_or_zero("Google Ads Clicks") + summary.get_or_zero("Facebook Clicks");

    let roas_delta = (roas > 0.0 && targets.roas_target > 0.0)
        .then(|| format!("{:.1}%", (roas - targets.roas_target) / targets.roas_target * 100.0));

    vec![
        KpiCard {
            label: "ROAS".to_string(),
            value: format!("{:.2}", roas),
            delta: roas_delta,
            inverse: false,
        },
        KpiCard {
            label: "Total Revenue".to_string(),
            value: if revenue > 0.0 { format_currency(revenue) } else { "$0".to_string() },
            delta: (revenue > targets.revenue_benchmark)
                .then(|| format_currency(revenue - targets.revenue_benchmark)),
            inverse: false,
        },
        KpiCard {
            label: "Total Cost".to_string(),
            value: if cost > 0.0 { format_currency(cost) } else { "$0".to_string() },
            delta: (cost < targets.cost_budget).then(|| format_currency(cost - targets.cost_budget)),
            inverse: true,
        },
        KpiCard {
            label: "Total Clicks".to_string(),
            value: if clicks > 0.0 { format_thousands(clicks) } else { "0".to_string() },
            delta: None,
            inverse: false,
        },
    ]
}
