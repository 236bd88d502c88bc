//! Chart projections over the metrics table

use crate::models::record::{distinct_in_order, MetricRecord};
use crate::models::summary::{ChannelClicks, KpiComparison};
use crate::parser::{extract, parse_lenient};

const CLICKS_KPI: &str = "Clicks";

/// Clicks per channel, for every channel that has a Clicks row
///
/// Channels appear in first-appearance order. Channels without a Clicks row
/// are omitted rather than zero-filled.
pub fn channel_clicks(records: &[MetricRecord]) -> Vec<ChannelClicks> {
    distinct_in_order(records.iter().map(|r| r.channel.as_str()))
        .into_iter()
        .filter_map(|channel| {
            let row = records.iter().find(|r| r.is(&channel, CLICKS_KPI))?;
            Some(ChannelClicks {
                clicks: extract(&row.value),
                channel,
            })
        })
        .collect()
}

/// Actual vs target for each row in the view
///
/// Rows where either the value or the target does not parse are dropped.
pub fn actual_vs_target<'a, I>(rows: I) -> Vec<KpiComparison>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    rows.into_iter()
        .filter_map(|row| {
            let value = parse_lenient(&row.value).ok()?;
            let target = parse_lenient(&row.target).ok()?;
            Some(KpiComparison {
                kpi: row.kpi.clone(),
                channel: row.channel.clone(),
                value,
                target,
            })
        })
        .collect()
}
