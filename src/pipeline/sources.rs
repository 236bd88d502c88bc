//! Analytics and ads data sources
//!
//! Both sources cover a trailing window of days and return one row per day
//! (analytics) or per day and campaign (ads).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Daily analytics aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaDailyRow {
    pub date: NaiveDate,
    pub users: i64,
    pub sessions: i64,
    pub avg_session_duration: f64,
    pub conversion_rate: f64,
}

/// Daily ads performance for one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsDailyRow {
    pub date: NaiveDate,
    pub campaign_name: String,
    pub impressions: i64,
    pub clicks: i64,
    pub cost: f64,
    pub conversions: f64,
    /// Absent when the campaign had no conversions that day
    pub cpa: Option<f64>,
}

/// Source of analytics and ads rows
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Prepare clients (credentials, tokens) before a run
    async fn initialize(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn fetch_ga4_data(&self) -> Result<Vec<GaDailyRow>, PipelineError>;

    async fn fetch_ads_data(&self) -> Result<Vec<AdsDailyRow>, PipelineError>;
}

/// Daily analytics query over the events table
pub fn ga4_query(events_table: &str, window_days: u32) -> String {
    format!(
        r#"SELECT
    DATE(event_timestamp) AS date,
    COUNT(DISTINCT user_id) AS users,
    COUNT(*) AS sessions,
    ROUND(AVG(session_duration), 2) AS avg_session_duration,
    ROUND(COUNTIF(event_name = 'purchase') / COUNT(*) * 100, 2) AS conversion_rate
FROM `{events_table}`
WHERE DATE(event_timestamp) >= DATE_SUB(CURRENT_DATE(), INTERVAL {window_days} DAY)
GROUP BY date
ORDER BY date DESC"#
    )
}

/// Daily per-campaign ads query
///
/// CPA is NULL for days without conversions instead of failing the query.
pub fn ads_query(ads_table: &str, window_days: u32) -> String {
    format!(
        r#"SELECT
    DATE(event_date) AS date,
    campaign_name,
    SUM(impressions) AS impressions,
    SUM(clicks) AS clicks,
    SUM(cost) AS cost,
    SUM(conversions) AS conversions,
    ROUND(SAFE_DIVIDE(SUM(cost), SUM(conversions)), 2) AS cpa
FROM `{ads_table}`
WHERE DATE(event_date) >= DATE_SUB(CURRENT_DATE(), INTERVAL {window_days} DAY)
GROUP BY date, campaign_name
ORDER BY date DESC"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ga4_query_window_and_table() {
        let sql = ga4_query("project.dataset.events_*", 30);
        assert!(sql.contains("FROM `project.dataset.events_*`"));
        assert!(sql.contains("INTERVAL 30 DAY"));
        assert!(sql.contains("GROUP BY date"));
    }

    #[test]
    fn test_ads_query_groups_by_campaign() {
        let sql = ads_query("project.dataset.google_ads", 7);
        assert!(sql.contains("FROM `project.dataset.google_ads`"));
        assert!(sql.contains("INTERVAL 7 DAY"));
        assert!(sql.contains("GROUP BY date, campaign_name"));
        assert!(sql.contains("SAFE_DIVIDE"));
    }
}
