//! KPI reduction over typed analytics and ads rows
//!
//! The inputs come from typed query results, so this is plain summing and
//! averaging with no string parsing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::sources::{AdsDailyRow, GaDailyRow};

/// KPIs pushed to the spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineKpis {
    pub total_users: i64,
    pub total_sessions: i64,
    pub avg_conversion_rate: f64,
    pub avg_cpa: f64,
    pub total_spend: f64,
    pub roas: f64,
}

/// Arithmetic mean, 0.0 for no values
fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Number of distinct campaigns in the ads rows
pub fn campaign_count(ads: &[AdsDailyRow]) -> usize {
    ads.iter()
        .map(|row| row.campaign_name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Reduce the trailing-window rows to the six dashboard KPIs
///
/// `avg_cpa` averages only rows that have a CPA. `roas` is
/// conversions * 100 / cost, and 0 when there is no spend.
pub fn calculate_kpis(ga: &[GaDailyRow], ads: &[AdsDailyRow]) -> PipelineKpis {
    let total_spend: f64 = ads.iter().map(|row| row.cost).sum();
    let total_conversions: f64 = ads.iter().map(|row| row.conversions).sum();

    let roas = if total_spend > 0.0 {
        total_conversions * 100.0 / total_spend
    } else {
        0.0
    };

    PipelineKpis {
        total_users: ga.iter().map(|row| row.users).sum(),
        total_sessions: ga.iter().map(|row| row.sessions).sum(),
        avg_conversion_rate: mean(ga.iter().map(|row| row.conversion_rate)),
        avg_cpa: mean(ads.iter().filter_map(|row| row.cpa)),
        total_spend,
        roas,
    }
}
