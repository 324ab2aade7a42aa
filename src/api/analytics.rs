//! Usage statistics

use crate::http::{ApiClient, ClientResult, RequestOptions};
use serde::{Deserialize, Serialize};

const BASE: &str = "/api/admin/analytics";

/// Window used by [`AnalyticsApi::daily`] when none is given
pub const DEFAULT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_sessions: u64,
    pub today_sessions: u64,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub count: u64,
}

pub struct AnalyticsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AnalyticsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn overview(&self) -> ClientResult<OverviewStats> {
        self.client.get(&format!("{BASE}/overview")).await
    }

    /// Sessions per day over the last `days` days
    pub async fn daily(&self, days: Option<u32>) -> ClientResult<Vec<DailyStats>> {
        let options = RequestOptions::get().query("days", days.unwrap_or(DEFAULT_DAYS));
        self.client.send(&format!("{BASE}/daily"), options).await
    }
}
