//! Date and channel filters for the metrics view
//!
//! Filters never modify the loaded dataset; they produce a borrowed view.

use serde::{Deserialize, Serialize};

use crate::models::record::{distinct_in_order, MetricRecord};

/// Channel option that disables channel filtering
pub const ALL_CHANNELS: &str = "All";

/// Channel selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelFilter {
    #[default]
    All,
    Only(String),
}

impl From<String> for ChannelFilter {
    fn from(s: String) -> Self {
        if s == ALL_CHANNELS {
            ChannelFilter::All
        } else {
            ChannelFilter::Only(s)
        }
    }
}

impl From<&str> for ChannelFilter {
    fn from(s: &str) -> Self {
        ChannelFilter::from(s.to_string())
    }
}

impl From<ChannelFilter> for String {
    fn from(filter: ChannelFilter) -> Self {
        match filter {
            ChannelFilter::All => ALL_CHANNELS.to_string(),
            ChannelFilter::Only(channel) => channel,
        }
    }
}

impl ChannelFilter {
    pub fn matches(&self, channel: &str) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Only(c) => c == channel,
        }
    }
}

/// Current date/channel selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilter {
    /// Exact date match; `None` keeps all dates
    pub date: Option<String>,
    #[serde(default)]
    pub channel: ChannelFilter,
}

impl DashboardFilter {
    /// Most recent date, all channels
    pub fn default_for(records: &[MetricRecord]) -> Self {
        Self {
            date: available_dates(records).into_iter().next(),
            channel: ChannelFilter::All,
        }
    }

    pub fn matches(&self, record: &MetricRecord) -> bool {
        let date_ok = self.date.as_deref().map_or(true, |d| record.date == d);
        date_ok && self.channel.matches(&record.channel)
    }
}

/// Distinct dates, most recent first
///
/// Dates are compared as strings, which orders ISO `YYYY-MM-DD` values
/// chronologically.
pub fn available_dates(records: &[MetricRecord]) -> Vec<String> {
    let mut dates = distinct_in_order(records.iter().map(|r| r.date.as_str()));
    dates.sort_by(|a, b| b.cmp(a));
    dates
}

/// Channel options: "All" followed by channels in first-appearance order
pub fn available_channels(records: &[MetricRecord]) -> Vec<String> {
    let channels = distinct_in_order(records.iter().map(|r| r.channel.as_str()));
    if channels.is_empty() {
        return channels;
    }
    std::iter::once(ALL_CHANNELS.to_string()).chain(channels).collect()
}

/// Apply a filter, returning the matching rows in table order
pub fn apply_filter<'a>(records: &'a [MetricRecord], filter: &DashboardFilter) -> Vec<&'a MetricRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}
