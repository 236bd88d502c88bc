//! Data models module
//!
//! Contains all data structures used throughout the application:
//! - Metric and raw event records
//! - KPI summary and chart point types

pub mod record;
pub mod summary;
