//! HTTP error types
//!
//! Two failure kinds are kept apart: [`ClientError::Transport`] when the
//! request never completed, and [`ClientError::Http`] when the server
//! answered with a non-2xx status.

use crate::session::SessionError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message used when an error response carries no usable message
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Error body returned by the backend, decoded best-effort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<Value>,

    /// FastAPI-style `{"detail": ...}` bodies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorPayload {
    /// Decode an error body. Anything other than a JSON object yields `None`.
    pub fn parse(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(body).ok()? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    /// `message` if present, otherwise a string `detail`
    pub fn resolved_message(&self) -> Option<&str> {
        self.message.as_deref().or(match &self.detail {
            Some(Value::String(detail)) => Some(detail.as_str()),
            _ => None,
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A non-2xx response, normalized
#[derive(Debug, Clone, PartialEq, Error)]
#[error("HTTP {status}: {message}")]
pub struct HttpError {
    status: u16,
    message: String,
    payload: Option<ErrorPayload>,
    request_id: Option<String>,
}

impl HttpError {
    pub fn new(status: u16, payload: Option<ErrorPayload>, request_id: Option<String>) -> Self {
        let message = payload
            .as_ref()
            .and_then(ErrorPayload::resolved_message)
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();

        Self {
            status,
            message,
            payload,
            request_id,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> Option<&ErrorPayload> {
        self.payload.as_ref()
    }

    /// Value of the `x-request-id` response header
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Errors returned by [`ApiClient`](super::ApiClient)
#[derive(Error, Debug)]
pub enum ClientError {
    /// The exchange failed on the wire (DNS, connect, TLS, timeout, cut-off body)
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The request could not be built; nothing was sent
    #[error("Failed to build request: {0}")]
    InvalidRequest(#[source] reqwest::Error),

    /// The server rejected the request
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A 2xx body could not be decoded as the expected type
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The server answered 204 where a body was required
    #[error("Response had no content")]
    EmptyResponse,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status for protocol failures
    pub fn status(&self) -> Option<u16> {
        self.as_http().map(HttpError::status)
    }

    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            ClientError::Http(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
