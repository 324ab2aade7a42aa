//! Dashboard metrics

use crate::http::{ApiClient, ClientResult, RequestOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PATH: &str = "/api/v1/metrics";

/// Time window of the dashboard summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl MetricsRange {
    pub const ALL: [MetricsRange; 3] = [MetricsRange::Day, MetricsRange::Week, MetricsRange::Month];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricsRange::Day => "24h",
            MetricsRange::Week => "7d",
            MetricsRange::Month => "30d",
        }
    }
}

impl fmt::Display for MetricsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metrics range '{0}' (expected 24h, 7d or 30d)")]
pub struct ParseRangeError(pub String);

impl FromStr for MetricsRange {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MetricsRange::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseRangeError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricKpi {
    pub key: String,
    pub title: String,
    pub description: String,
    pub value: f64,
    pub delta: f64,
    pub trend: Trend,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub name: String,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsTrend {
    pub timestamps: Vec<String>,
    pub series: Vec<TrendSeries>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Healthy,
    Degraded,
    Down,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: ComponentState,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatuses {
    pub milvus: ComponentStatus,
    pub redis: ComponentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub kpis: Vec<MetricKpi>,
    pub trend: MetricsTrend,
    pub status: ComponentStatuses,
    pub generated_at: String,
}

impl DashboardMetrics {
    pub fn kpi(&self, key: &str) -> Option<&MetricKpi> {
        self.kpis.iter().find(|k| k.key == key)
    }
}

pub struct MetricsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> MetricsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn summary(&self, range: MetricsRange) -> ClientResult<DashboardMetrics> {
        self.client
            .send(PATH, RequestOptions::get().query("range", range))
            .await
    }
}
