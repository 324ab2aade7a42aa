//! # RAG Admin
//!
//! Client-side infrastructure for administering a retrieval-augmented
//! generation backend: a typed HTTP client, a scoped structured logger, and
//! wrappers for every admin endpoint.
//!
//! ## Modules
//!
//! - [`http`]: Request pipeline, error normalization and multipart uploads
//! - [`logging`]: Leveled, scoped logger with structured metadata
//! - [`session`]: Where the login token lives between calls
//! - [`api`]: Knowledge base, FAQ, conversation, analytics and settings endpoints
//! - [`config`]: TOML file and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_admin::api::SearchParams;
//! use rag_admin::http::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!
//!     client.auth().login("admin", "secret").await?;
//!
//!     let params = SearchParams {
//!         query: "refund policy".into(),
//!         top_k: Some(3),
//!         ..Default::default()
//!     };
//!     for hit in client.knowledge().search(&params).await?.results {
//!         println!("{:.3} {}", hit.score, hit.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod http;
pub mod logging;
pub mod session;

// Re-export top-level types for convenience
pub use http::{
    ApiClient, ApiClientBuilder, Body, ClientError, ClientResult, Credentials, HttpError,
    Navigator, RequestOptions,
};

pub use logging::{Level, LogSink, Logger, MetaValue, Metadata};

pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, SessionConfig};
