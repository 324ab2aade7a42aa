//! HTTP Client Wrapper
//!
//! Issues calls against the RAG backend and normalizes their outcome.
//!
//! ## Pipeline
//!
//! 1. Merge caller headers over `Content-Type: application/json`
//! 2. Attach `Authorization: Bearer ...` unless the caller set one: the
//!    session token when credentials are included, else the API key
//! 3. Send against the configured base URL, timing the call
//! 4. Transport failure: log and return [`ClientError::Transport`]
//! 5. Non-2xx: decode the error body best-effort into [`HttpError`]
//! 6. 204: no body; other 2xx: decode JSON
//!
//! A client built with a session guard also clears the session and
//! navigates to the login screen on any 401.

mod client;
mod error;
mod request;
mod upload;

pub use client::{
    ApiClient, ApiClientBuilder, Navigator, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, LOGIN_PATH,
    REQUEST_ID_HEADER,
};
pub use error::{ClientError, ClientResult, ErrorPayload, HttpError, FALLBACK_MESSAGE};
pub use request::{Body, Credentials, RequestOptions};
pub use upload::{guess_mime, percent, FilePart, MultipartBody, ProgressCallback, ProgressTracker};
