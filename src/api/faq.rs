//! FAQ management
//!
//! FAQs are imported from CSV files. The backend builds each FAQ's text from
//! `text_columns` (or `text_template`) and embeds `embedding_columns`.

use super::{segment, MessageResponse};
use crate::http::{ApiClient, ClientResult, FilePart, MultipartBody, ProgressCallback, RequestOptions};
use crate::logging::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

const BASE: &str = "/api/admin/faq";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqListResponse {
    pub faqs: Vec<Faq>,
    pub total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FaqListParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvPreviewResponse {
    pub columns: Vec<String>,
    pub preview_rows: Vec<BTreeMap<String, String>>,
    pub total_rows: u64,
    pub detected_language: String,
}

/// A CSV import; column lists are sent comma-joined
pub struct FaqImportRequest {
    pub file: FilePart,
    pub text_columns: Vec<String>,
    pub embedding_columns: Vec<String>,
    pub text_template: Option<String>,
    pub language: Option<String>,
    pub progress: Option<ProgressCallback>,
}

impl FaqImportRequest {
    pub fn new(file: FilePart, text_columns: Vec<String>, embedding_columns: Vec<String>) -> Self {
        Self {
            file,
            text_columns,
            embedding_columns,
            text_template: None,
            language: None,
            progress: None,
        }
    }

    /// Requested columns not present in `available`, in request order
    pub fn missing_columns(&self, available: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for column in self.text_columns.iter().chain(&self.embedding_columns) {
            if !available.contains(column) && !missing.contains(column) {
                missing.push(column.clone());
            }
        }
        missing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqImportResponse {
    pub success: bool,
    pub imported_count: u64,
    pub message: String,
}

/// Header row of a local CSV file
pub fn csv_columns(path: impl AsRef<Path>) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect())
}

pub struct FaqApi<'a> {
    client: &'a ApiClient,
}

impl<'a> FaqApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Columns, sample rows and detected language of a CSV file
    pub async fn preview_csv(&self, mut file: FilePart) -> ClientResult<CsvPreviewResponse> {
        file.field = "file".to_string();
        self.client
            .send(
                &format!("{BASE}/upload/preview"),
                RequestOptions::post().multipart(MultipartBody::new().file(file)),
            )
            .await
    }

    pub async fn import_csv(&self, request: FaqImportRequest) -> ClientResult<FaqImportResponse> {
        let FaqImportRequest {
            mut file,
            text_columns,
            embedding_columns,
            text_template,
            language,
            progress,
        } = request;

        file.field = "file".to_string();
        let file_name = file.file_name.clone();
        let body = MultipartBody::new()
            .file(file)
            .text("text_columns", text_columns.join(","))
            .text("embedding_columns", embedding_columns.join(","))
            .text_opt("text_template", text_template.filter(|t| !t.is_empty()))
            .text_opt("language", language.filter(|l| !l.is_empty()))
            .progress(progress);

        let response: FaqImportResponse = self
            .client
            .send(
                &format!("{BASE}/upload/import"),
                RequestOptions::post().multipart(body),
            )
            .await?;

        self.client.logger().info(
            "FAQ import finished",
            Some(
                Metadata::new()
                    .with("file", file_name)
                    .with("success", response.success)
                    .with("imported", response.imported_count),
            ),
        );
        Ok(response)
    }

    pub async fn list(&self, params: &FaqListParams) -> ClientResult<FaqListResponse> {
        let options = RequestOptions::get()
            .query_opt("skip", params.skip)
            .query_opt("limit", params.limit)
            .query_opt("language", params.language.as_deref());
        self.client.send(&format!("{BASE}/list"), options).await
    }

    pub async fn get(&self, id: &str) -> ClientResult<Faq> {
        self.client.get(&format!("{BASE}/{}", segment(id))).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<MessageResponse> {
        self.client.delete(&format!("{BASE}/{}", segment(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::builder()
            .base_url(server.base_url())
            .build()
            .unwrap()
    }

    #[test]
    fn test_csv_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("faq.csv");
        std::fs::write(&path, "\u{feff}question, answer ,category\nq1,a1,billing\n").unwrap();

        assert_eq!(csv_columns(&path).unwrap(), vec!["question", "answer", "category"]);
        assert!(csv_columns(dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_missing_columns() {
        let request = FaqImportRequest::new(
            FilePart::new("file", "faq.csv", "question,answer\n"),
            vec!["question".into(), "answer".into()],
            vec!["question".into(), "keywords".into()],
        );
        let available = vec!["question".to_string(), "answer".to_string()];
        assert_eq!(request.missing_columns(&available), vec!["keywords"]);
    }

    #[tokio::test]
    async fn test_import_csv() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/faq/upload/import")
                .body_includes("name=\"text_columns\"")
                .body_includes("question,answer")
                .body_includes("name=\"language\"");
            then.status(200).json_body(json!({
                "success": true,
                "imported_count": 2,
                "message": "Imported 2 FAQs"
            }));
        });

        let seen = Arc::new(Mutex::new(Vec::<u8>::new()));
        let recorder = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |pct: u8| recorder.lock().unwrap().push(pct));

        let mut request = FaqImportRequest::new(
            FilePart::new("upload", "faq.csv", "question,answer\nq1,a1\nq2,a2\n"),
            vec!["question".into(), "answer".into()],
            vec!["question".into()],
        );
        request.language = Some("en".into());
        request.text_template = Some(String::new());
        request.progress = Some(callback);

        let response = client_for(&server).faq().import_csv(request).await.unwrap();
        m.assert();

        assert_eq!(response.imported_count, 2);
        assert_eq!(seen.lock().unwrap().last(), Some(&100));
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET)
                .path("/api/admin/faq/list")
                .query_param("skip", "0")
                .query_param("limit", "50")
                .query_param_missing("language");
            then.status(200).json_body(json!({
                "faqs": [{
                    "id": "f1",
                    "question": "How do refunds work?",
                    "answer": "Within 5 days.",
                    "text": "How do refunds work? Within 5 days.",
                    "metadata": {"category": "billing"},
                    "created_at": 1700000000
                }],
                "total": 1
            }));
        });
        let missing = server.mock(|when, then| {
            when.method(GET).path("/api/admin/faq/nope");
            then.status(404).json_body(json!({"detail": "FAQ not found"}));
        });

        let client = client_for(&server);
        let params = FaqListParams {
            skip: Some(0),
            limit: Some(50),
            language: None,
        };
        let response = client.faq().list(&params).await.unwrap();
        list.assert();
        assert_eq!(response.faqs[0].question, "How do refunds work?");

        let err = client.faq().get("nope").await.unwrap_err();
        missing.assert();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.as_http().unwrap().message(), "FAQ not found");
    }
}
