//! RAG Backend Endpoints
//!
//! Typed wrappers over the backend REST API, all routed through
//! [`ApiClient`]. Each area is reached through a borrowed handle, e.g.
//! `client.knowledge().search(...)`.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/admin/auth/login` - Exchange credentials for a token
//! - `POST /api/admin/auth/refresh` - Refresh an access token
//!
//! ## Knowledge base
//! - `GET /api/admin/knowledge/documents` - List documents
//! - `GET|PUT|DELETE /api/admin/knowledge/documents/:id` - One document
//! - `POST /api/admin/knowledge/upload` - Upload files (multipart)
//! - `GET /api/admin/knowledge/uploads` - Upload records
//! - `GET|DELETE /api/admin/knowledge/uploads/:id` - Status / roll back
//! - `POST /api/admin/knowledge/uploads/:id/retry` - Retry an upload
//! - `POST /api/admin/knowledge/preview` - Chunking preview (multipart)
//! - `GET /api/v1/knowledge/documents` - Document catalog
//! - `POST /api/v1/knowledge/upsert` - Insert raw documents
//! - `GET /api/v1/knowledge/search` - Semantic search
//!
//! ## FAQ
//! - `POST /api/admin/faq/upload/preview` - CSV preview (multipart)
//! - `POST /api/admin/faq/upload/import` - CSV import (multipart)
//! - `GET /api/admin/faq/list` - List FAQs
//! - `GET|DELETE /api/admin/faq/:id` - One FAQ
//!
//! ## Conversations
//! - `GET /api/admin/conversations/history` - Conversation history
//! - `GET /api/admin/conversations/sessions/:id` - One chat session
//!
//! ## Analytics & monitoring
//! - `GET /api/admin/analytics/overview` - Overview counters
//! - `GET /api/admin/analytics/daily` - Sessions per day
//! - `GET /api/v1/metrics` - Dashboard KPIs and component status
//!
//! ## Settings
//! - `GET /api/admin/settings/config` - System configuration
//! - `GET /api/admin/settings/health` - Dependency health

pub mod analytics;
pub mod auth;
pub mod conversations;
pub mod faq;
pub mod knowledge;
pub mod metrics;
pub mod settings;

pub use analytics::{AnalyticsApi, DailyStats, OverviewStats};
pub use auth::{AuthApi, LoginRequest, LoginResponse, RefreshRequest};
pub use conversations::{Conversation, ConversationListResponse, ConversationsApi, HistoryParams};
pub use faq::{
    csv_columns, CsvPreviewResponse, Faq, FaqApi, FaqImportRequest, FaqImportResponse, FaqListParams,
    FaqListResponse,
};
pub use knowledge::{
    CatalogDocument, CatalogParams, CatalogResponse, Document, DocumentListParams,
    DocumentListResponse, DocumentStatus, DocumentUpdateRequest, FilePreviewResponse,
    FileUploadResponse, KnowledgeApi, SearchParams, SearchResponse, SearchResult, UploadOptions,
    UploadStatusResponse, UpsertDocument, UpsertRequest, UpsertResponse,
};
pub use metrics::{
    ComponentState, ComponentStatus, DashboardMetrics, MetricKpi, MetricsApi, MetricsRange,
    ParseRangeError, Trend,
};
pub use settings::{HealthCheck, ServiceHealth, SettingsApi, SystemConfig};

use crate::http::ApiClient;
use serde::{Deserialize, Serialize};

/// `{"message": "..."}` acknowledgement returned by mutating endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn knowledge(&self) -> KnowledgeApi<'_> {
        KnowledgeApi::new(self)
    }

    pub fn faq(&self) -> FaqApi<'_> {
        FaqApi::new(self)
    }

    pub fn conversations(&self) -> ConversationsApi<'_> {
        ConversationsApi::new(self)
    }

    pub fn analytics(&self) -> AnalyticsApi<'_> {
        AnalyticsApi::new(self)
    }

    pub fn settings(&self) -> SettingsApi<'_> {
        SettingsApi::new(self)
    }

    pub fn metrics(&self) -> MetricsApi<'_> {
        MetricsApi::new(self)
    }
}

/// Percent-encode a single path segment such as an id
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("doc-1_a.b~"), "doc-1_a.b~");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("é"), "%C3%A9");
    }
}
