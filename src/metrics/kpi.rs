//! KPI summary extraction
//!
//! The summary is driven by a table of (channel, KPI, summary key) lookups
//! rather than per-channel branches. Only the listed pairs are tracked; the
//! set is not derived from the channels present in the data.

use serde::{Deserialize, Serialize};

use crate::models::record::MetricRecord;
use crate::models::summary::{DuplicateKpi, KpiSummary};
use crate::parser::extract;

/// Overall channel name
pub const OVERALL: &str = "Overall";

/// One tracked (channel, KPI) pair and the summary key it is stored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiLookup {
    pub channel: String,
    pub kpi: String,
    pub summary_key: String,
}

impl KpiLookup {
    pub fn new(channel: &str, kpi: &str, summary_key: &str) -> Self {
        Self {
            channel: channel.to_string(),
            kpi: kpi.to_string(),
            summary_key: summary_key.to_string(),
        }
    }
}

/// Default tracked KPIs
///
/// Email is part of the channel set but has no tracked KPI.
pub fn default_lookups() -> Vec<KpiLookup> {
    vec![
        KpiLookup::new(OVERALL, "ROAS", "ROAS"),
        KpiLookup::new(OVERALL, "Total Revenue", "Total Revenue"),
        KpiLookup::new(OVERALL, "Total Cost", "Total Cost"),
        KpiLookup::new("Google Ads", "Clicks", "Google Ads Clicks"),
        KpiLookup::new("Google Ads", "Conversions", "Google Ads Conversions"),
        KpiLookup::new("Facebook", "Clicks", "Facebook Clicks"),
        KpiLookup::new("Organic", "Sessions", "Organic Sessions"),
    ]
}

/// Summarize the metrics table with the default lookups
pub fn summarize(records: &[MetricRecord]) -> KpiSummary {
    summarize_with(records, &default_lookups())
}

/// Summarize the metrics table with an explicit lookup table
///
/// The first matching row wins. Pairs that occur more than once are still
/// resolved to the first row but reported in `KpiSummary::duplicates`.
pub fn summarize_with(records: &[MetricRecord], lookups: &[KpiLookup]) -> KpiSummary {
    let mut summary = KpiSummary::new();

    for lookup in lookups {
        let mut matches = records
            .iter()
            .filter(|r| r.is(&lookup.channel, &lookup.kpi));

        let Some(first) = matches.next() else {
            continue;
        };
        summary.insert(&lookup.summary_key, extract(&first.value));

        let extra = matches.count();
        if extra > 0 {
            tracing::warn!(
                "Duplicate rows for {} / {}: {} occurrences, using the first",
                lookup.channel,
                lookup.kpi,
                extra + 1
            );
            summary.duplicates.push(DuplicateKpi {
                channel: lookup.channel.clone(),
                kpi: lookup.kpi.clone(),
                occurrences: extra + 1,
            });
        }
    }

    summary
}
