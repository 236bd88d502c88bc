//! Record types loaded from the metrics store
//!
//! Values are kept as the strings found in the file. Numeric conversion
//! happens later through the lenient parser.

use serde::{Deserialize, Serialize};

/// One row of the dashboard metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "KPI")]
    pub kpi: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Target")]
    pub target: String,
}

impl MetricRecord {
    pub fn new(date: &str, channel: &str, kpi: &str, value: &str, target: &str) -> Self {
        Self {
            date: date.to_string(),
            channel: channel.to_string(),
            kpi: kpi.to_string(),
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    /// True if this row is the given (channel, kpi) pair
    pub fn is(&self, channel: &str, kpi: &str) -> bool {
        self.channel == channel && self.kpi == kpi
    }
}

/// Raw event export (secondary dataset)
///
/// The columns of the export are not fixed, so rows are stored positionally
/// alongside the header line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEventTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawEventTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows, for previews
    pub fn head(&self, n: usize) -> RawEventTable {
        RawEventTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Distinct values in first-appearance order
pub fn distinct_in_order<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}
