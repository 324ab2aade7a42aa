//! System settings and dependency health

use crate::http::{ApiClient, ClientResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BASE: &str = "/api/admin/settings";

/// Read-only view of the backend's model and storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub llm_provider: String,
    pub llm_model: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub vector_top_k: u32,
    pub vector_score_threshold: f64,
    pub milvus_host: String,
    pub milvus_port: u16,
    pub redis_host: String,
    pub redis_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceHealth>,
}

impl HealthCheck {
    /// Services whose status is not `healthy`
    pub fn unhealthy(&self) -> impl Iterator<Item = (&str, &ServiceHealth)> {
        self.services
            .iter()
            .filter(|(_, s)| !s.status.eq_ignore_ascii_case("healthy"))
            .map(|(name, s)| (name.as_str(), s))
    }
}

pub struct SettingsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SettingsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn config(&self) -> ClientResult<SystemConfig> {
        self.client.get(&format!("{BASE}/config")).await
    }

    pub async fn health(&self) -> ClientResult<HealthCheck> {
        self.client.get(&format!("{BASE}/health")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_system_config() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/settings/config");
            then.status(200).json_body(json!({
                "llm_provider": "openai",
                "llm_model": "gpt-4o-mini",
                "embedding_provider": "openai",
                "embedding_model": "text-embedding-3-small",
                "vector_top_k": 5,
                "vector_score_threshold": 0.3,
                "milvus_host": "milvus",
                "milvus_port": 19530,
                "redis_host": "redis",
                "redis_port": 6379
            }));
        });

        let client = ApiClient::builder().base_url(server.base_url()).build().unwrap();
        let config = client.settings().config().await.unwrap();
        assert_eq!(config.milvus_port, 19530);
        assert_eq!(config.vector_top_k, 5);
    }

    #[tokio::test]
    async fn test_health_lists_unhealthy_services() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/settings/health");
            then.status(200).json_body(json!({
                "status": "degraded",
                "services": {
                    "milvus": {"status": "healthy", "message": "ok"},
                    "redis": {"status": "unhealthy", "message": "connection refused"}
                }
            }));
        });

        let client = ApiClient::builder().base_url(server.base_url()).build().unwrap();
        let health = client.settings().health().await.unwrap();
        let unhealthy: Vec<_> = health.unhealthy().map(|(name, _)| name).collect();
        assert_eq!(health.status, "degraded");
        assert_eq!(unhealthy, vec!["redis"]);
    }
}
