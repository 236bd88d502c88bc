//! KPI summary and chart data types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A looked-up (channel, KPI) pair that occurs more than once in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateKpi {
    pub channel: String,
    pub kpi: String,
    pub occurrences: usize,
}

/// Named summary metrics extracted from the metrics table
///
/// Entries exist only for rows present in the dataset. Readers supply their
/// own default through `get_or_zero`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub values: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<DuplicateKpi>,
}

impl KpiSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Display-time default for absent metrics
    pub fn get_or_zero(&self, key: &str) -> f64 {
        self.get(key).unwrap_or(0.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Clicks for one channel, over the unfiltered dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelClicks {
    pub channel: String,
    pub clicks: f64,
}

/// Actual vs target for one row of the filtered view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiComparison {
    pub kpi: String,
    pub channel: String,
    pub value: f64,
    pub target: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_zero() {
        let mut summary = KpiSummary::new();
        summary.insert("ROAS", 4.25);

        assert_eq!(summary.get("ROAS"), Some(4.25));
        assert_eq!(summary.get("Total Cost"), None);
        assert_eq!(summary.get_or_zero("Total Cost"), 0.0);
        assert!(summary.contains("ROAS"));
        assert_eq!(summary.len(), 1);
    }

    #[test]
    fn test_summary_serializes_without_empty_duplicates() {
        let mut summary = KpiSummary::new();
        summary.insert("ROAS", 2.0);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"ROAS\":2.0"));
        assert!(!json.contains("duplicates"));
    }
}
