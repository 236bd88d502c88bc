//! Metrics calculation module
//!
//! This module handles computing dashboard metrics from the metrics table:
//! - KPI summary extraction via a (channel, KPI) lookup table
//! - Chart projections (clicks by channel, actual vs target)
//! - Date/channel filtering
//! - KPI card formatting

pub mod cards;
pub mod filter;
pub mod kpi;
pub mod projections;

pub use cards::{build_cards, KpiCard};
pub use filter::{apply_filter, available_channels, available_dates, ChannelFilter, DashboardFilter};
pub use kpi::{default_lookups, summarize, summarize_with, KpiLookup};
pub use projections::{actual_vs_target, channel_clicks};
