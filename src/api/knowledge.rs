//! Knowledge base management
//!
//! Document CRUD, file uploads with progress, upload records, and the
//! catalog/upsert/search endpoints used by the dashboard.

use super::{segment, MessageResponse};
use crate::http::{ApiClient, ClientResult, FilePart, MultipartBody, ProgressCallback, RequestOptions};
use crate::logging::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const ADMIN_BASE: &str = "/api/admin/knowledge";
const V1_BASE: &str = "/api/v1/knowledge";

/// Collection used when an upsert names none
pub const DEFAULT_COLLECTION: &str = "knowledge_base";
pub const DEFAULT_CHUNK_SIZE: u32 = 500;
pub const DEFAULT_CHUNK_OVERLAP: u32 = 50;

// ============================================
// Documents
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentUpdateRequest {
    pub content: String,
    pub metadata: Map<String, Value>,
}

// ============================================
// Uploads
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub upload_id: String,
    pub filename: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStatusResponse {
    pub upload_id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: u64,
    pub status: String,
    pub progress: f64,
    pub document_count: u64,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePreviewResponse {
    pub filename: String,
    pub file_type: String,
    pub chunks: Vec<String>,
    pub total_chunks: u64,
    pub estimated_tokens: u64,
}

/// Optional fields for [`KnowledgeApi::upload_files`]
#[derive(Default)]
pub struct UploadOptions {
    pub source: Option<String>,
    pub version: Option<String>,
    pub progress: Option<ProgressCallback>,
}

// ============================================
// Catalog / upsert / search
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Published,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Published => "published",
            DocumentStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "published" => Ok(DocumentStatus::Published),
            "archived" => Ok(DocumentStatus::Archived),
            other => Err(format!("unknown document status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub status: DocumentStatus,
    pub chunk_count: u64,
    pub updated_at: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Catalog filters; `status: None` lists every status
#[derive(Debug, Clone, Default)]
pub struct CatalogParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub keyword: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub documents: Vec<CatalogDocument>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct UpsertRequest {
    pub documents: Vec<UpsertDocument>,
    pub collection_name: Option<String>,
    pub chunk_size: Option<u32>,
    pub chunk_overlap: Option<u32>,
}

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    collection_name: &'a str,
    chunk_size: u32,
    chunk_overlap: u32,
    documents: &'a [UpsertDocument],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertResponse {
    pub success: bool,
    pub inserted_count: u64,
    pub collection_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: String,
    pub top_k: Option<u32>,
    pub collection_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub query: String,
    pub total_results: u64,
}

// ============================================
// Endpoints
// ============================================

pub struct KnowledgeApi<'a> {
    client: &'a ApiClient,
}

impl<'a> KnowledgeApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: &DocumentListParams) -> ClientResult<DocumentListResponse> {
        let options = RequestOptions::get()
            .query_opt("page", params.page)
            .query_opt("page_size", params.page_size)
            .query_opt("search", params.search.as_deref());
        self.client
            .send(&format!("{ADMIN_BASE}/documents"), options)
            .await
    }

    pub async fn get(&self, id: &str) -> ClientResult<Document> {
        self.client
            .get(&format!("{ADMIN_BASE}/documents/{}", segment(id)))
            .await
    }

    pub async fn update(&self, id: &str, update: &DocumentUpdateRequest) -> ClientResult<MessageResponse> {
        self.client
            .put_json(&format!("{ADMIN_BASE}/documents/{}", segment(id)), update)
            .await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<MessageResponse> {
        self.client
            .delete(&format!("{ADMIN_BASE}/documents/{}", segment(id)))
            .await
    }

    /// Upload files as `multipart/form-data`; one response per file
    pub async fn upload_files(
        &self,
        files: Vec<FilePart>,
        options: UploadOptions,
    ) -> ClientResult<Vec<FileUploadResponse>> {
        let count = files.len();
        let body = files
            .into_iter()
            .fold(MultipartBody::new(), |body, mut file| {
                file.field = "files".to_string();
                body.file(file)
            })
            .text_opt("source", options.source)
            .text_opt("version", options.version)
            .progress(options.progress);

        let bytes = body.total_file_bytes();
        self.client.logger().info(
            "Uploading knowledge files",
            Some(Metadata::new().with("files", count).with("bytes", bytes)),
        );

        self.client
            .send(
                &format!("{ADMIN_BASE}/upload"),
                RequestOptions::post().multipart(body),
            )
            .await
    }

    pub async fn uploads(&self, limit: Option<u32>) -> ClientResult<Vec<UploadStatusResponse>> {
        let options = RequestOptions::get().query_opt("limit", limit);
        self.client
            .send(&format!("{ADMIN_BASE}/uploads"), options)
            .await
    }

    pub async fn upload_status(&self, upload_id: &str) -> ClientResult<UploadStatusResponse> {
        self.client
            .get(&format!("{ADMIN_BASE}/uploads/{}", segment(upload_id)))
            .await
    }

    pub async fn retry_upload(&self, upload_id: &str) -> ClientResult<MessageResponse> {
        self.client
            .send(
                &format!("{ADMIN_BASE}/uploads/{}/retry", segment(upload_id)),
                RequestOptions::post(),
            )
            .await
    }

    /// Remove an upload and the documents it produced
    pub async fn rollback_upload(&self, upload_id: &str) -> ClientResult<MessageResponse> {
        self.client
            .delete(&format!("{ADMIN_BASE}/uploads/{}", segment(upload_id)))
            .await
    }

    /// Ask the backend how a file would be chunked, without storing it
    pub async fn preview(&self, mut file: FilePart) -> ClientResult<FilePreviewResponse> {
        file.field = "file".to_string();
        self.client
            .send(
                &format!("{ADMIN_BASE}/preview"),
                RequestOptions::post().multipart(MultipartBody::new().file(file)),
            )
            .await
    }

    pub async fn catalog(&self, params: &CatalogParams) -> ClientResult<CatalogResponse> {
        let options = RequestOptions::get()
            .query_opt("page", params.page)
            .query_opt("page_size", params.page_size)
            .query_opt("keyword", params.keyword.as_deref())
            .query_opt("status", params.status)
            .query_all("tags", &params.tags);
        self.client
            .send(&format!("{V1_BASE}/documents"), options)
            .await
    }

    pub async fn upsert(&self, request: &UpsertRequest) -> ClientResult<UpsertResponse> {
        let body = UpsertBody {
            collection_name: request
                .collection_name
                .as_deref()
                .unwrap_or(DEFAULT_COLLECTION),
            chunk_size: request.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: request.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            documents: &request.documents,
        };
        self.client
            .post_json(&format!("{V1_BASE}/upsert"), &body)
            .await
    }

    pub async fn search(&self, params: &SearchParams) -> ClientResult<SearchResponse> {
        let options = RequestOptions::get()
            .query("query", &params.query)
            .query_opt("top_k", params.top_k)
            .query_opt("collection_name", params.collection_name.as_deref());
        self.client
            .send(&format!("{V1_BASE}/search"), options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::builder()
            .base_url(server.base_url())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_documents() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/api/admin/knowledge/documents")
                .query_param("page", "2")
                .query_param("page_size", "20")
                .query_param("search", "refund");
            then.status(200).json_body(json!({
                "documents": [{
                    "id": "d1",
                    "text": "Refunds take 5 days",
                    "metadata": {"source": "policy.pdf", "page": 3},
                    "created_at": 1700000000
                }],
                "total": 21,
                "page": 2,
                "page_size": 20
            }));
        });

        let params = DocumentListParams {
            page: Some(2),
            page_size: Some(20),
            search: Some("refund".into()),
        };
        let response = client_for(&server).knowledge().list(&params).await.unwrap();
        m.assert();

        assert_eq!(response.total, 21);
        assert_eq!(response.documents[0].id, "d1");
        assert_eq!(response.documents[0].metadata.get("page"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_upload_files_reports_progress() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST).path("/api/admin/knowledge/upload");
            then.status(200).json_body(json!([{
                "upload_id": "u1",
                "filename": "manual.txt",
                "status": "pending",
                "message": "queued"
            }]));
        });

        let seen = Arc::new(Mutex::new(Vec::<u8>::new()));
        let recorder = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |pct: u8| recorder.lock().unwrap().push(pct));
        let options = UploadOptions {
            source: Some("handbook".into()),
            version: None,
            progress: Some(callback),
        };

        let file = FilePart::new("ignored", "manual.txt", vec![b'x'; 200 * 1024]);
        let responses = client_for(&server)
            .knowledge()
            .upload_files(vec![file], options)
            .await
            .unwrap();
        m.assert();

        assert_eq!(responses[0].upload_id, "u1");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_upsert_applies_defaults() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/knowledge/upsert")
                .json_body(json!({
                    "collection_name": "knowledge_base",
                    "chunk_size": 500,
                    "chunk_overlap": 50,
                    "documents": [{"text": "hello", "metadata": {"lang": "en"}}]
                }));
            then.status(200).json_body(json!({
                "success": true,
                "inserted_count": 1,
                "collection_name": "knowledge_base",
                "message": "ok"
            }));
        });

        let request = UpsertRequest {
            documents: vec![UpsertDocument {
                text: "hello".into(),
                metadata: Map::from_iter([("lang".to_string(), json!("en"))]),
            }],
            ..Default::default()
        };
        let response = client_for(&server).knowledge().upsert(&request).await.unwrap();
        m.assert();
        assert_eq!(response.inserted_count, 1);
    }

    #[tokio::test]
    async fn test_catalog_filters() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/knowledge/documents")
                .query_param("status", "published")
                .query_param("tags", "faq")
                .query_param("tags", "billing")
                .query_param_missing("keyword");
            then.status(200).json_body(json!({
                "documents": [{
                    "id": "c1",
                    "title": "Billing FAQ",
                    "tags": ["faq", "billing"],
                    "status": "published",
                    "chunk_count": 12,
                    "updated_at": "2024-01-01T00:00:00Z"
                }],
                "total": 1,
                "page": 1,
                "page_size": 20
            }));
        });

        let params = CatalogParams {
            tags: vec!["faq".into(), "billing".into()],
            status: Some(DocumentStatus::Published),
            ..Default::default()
        };
        let response = client_for(&server).knowledge().catalog(&params).await.unwrap();
        m.assert();
        assert_eq!(response.documents[0].status, DocumentStatus::Published);
        assert_eq!("Archived".parse::<DocumentStatus>(), Ok(DocumentStatus::Archived));
        assert!("deleted".parse::<DocumentStatus>().is_err());
    }

    #[tokio::test]
    async fn test_ids_are_path_encoded() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(DELETE).path("/api/admin/knowledge/uploads/a%2Fb");
            then.status(200).json_body(json!({"message": "rolled back"}));
        });

        let response = client_for(&server)
            .knowledge()
            .rollback_upload("a/b")
            .await
            .unwrap();
        m.assert();
        assert_eq!(response.message, "rolled back");
    }
}
