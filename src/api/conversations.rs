//! Conversation history

use super::segment;
use crate::http::{ApiClient, ClientResult, RequestOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const BASE: &str = "/api/admin/conversations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub session_id: String,
    pub user_message: String,
    pub ai_response: String,
    /// Shape varies across backend versions, kept as raw JSON
    #[serde(default)]
    pub retrieved_docs: Value,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Dates are passed through as `YYYY-MM-DD`
#[derive(Debug, Clone, Default)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub struct ConversationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ConversationsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn history(&self, params: &HistoryParams) -> ClientResult<ConversationListResponse> {
        let options = RequestOptions::get()
            .query_opt("page", params.page)
            .query_opt("page_size", params.page_size)
            .query_opt("start_date", params.start_date.as_deref())
            .query_opt("end_date", params.end_date.as_deref());
        self.client.send(&format!("{BASE}/history"), options).await
    }

    /// Every exchange of one chat session
    pub async fn session(&self, session_id: &str) -> ClientResult<Vec<Conversation>> {
        self.client
            .get(&format!("{BASE}/sessions/{}", segment(session_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn record(id: &str, confidence: Value) -> Value {
        json!({
            "id": id,
            "session_id": "s-1",
            "user_message": "hi",
            "ai_response": "hello",
            "retrieved_docs": [{"text": "greeting", "score": 0.9}],
            "confidence_score": confidence,
            "created_at": "2024-05-01T10:00:00"
        })
    }

    #[tokio::test]
    async fn test_history_with_date_range() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/api/admin/conversations/history")
                .query_param("page", "1")
                .query_param("start_date", "2024-05-01")
                .query_param("end_date", "2024-05-31")
                .query_param_missing("page_size");
            then.status(200).json_body(json!({
                "conversations": [record("c1", json!(0.82)), record("c2", Value::Null)],
                "total": 2,
                "page": 1,
                "page_size": 20
            }));
        });

        let client = ApiClient::builder().base_url(server.base_url()).build().unwrap();
        let params = HistoryParams {
            page: Some(1),
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-05-31".into()),
            ..Default::default()
        };
        let response = client.conversations().history(&params).await.unwrap();
        m.assert();

        assert_eq!(response.total, 2);
        assert_eq!(response.conversations[0].confidence_score, Some(0.82));
        assert_eq!(response.conversations[1].confidence_score, None);
        assert!(response.conversations[0].retrieved_docs.is_array());
    }

    #[tokio::test]
    async fn test_session_records() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/api/admin/conversations/sessions/s-1");
            then.status(200).json_body(json!([record("c1", json!(0.5))]));
        });

        let client = ApiClient::builder().base_url(server.base_url()).build().unwrap();
        let records = client.conversations().session("s-1").await.unwrap();
        m.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_id, "s-1");
    }
}
