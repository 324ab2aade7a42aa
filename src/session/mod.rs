//! Session Store
//!
//! Holds the bearer token and last-known username of the signed-in admin.
//! The HTTP client reads the token on every call; login writes it; logout
//! and a guarded 401 clear it. Both values are always written and cleared
//! together.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted credentials of the signed-in admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }
}

/// Storage backend for the current session
pub trait SessionStore: Send + Sync {
    /// Current session, if any
    fn get(&self) -> Result<Option<Session>, SessionError>;

    /// Replace the current session
    fn set(&self, session: &Session) -> Result<(), SessionError>;

    /// Forget the current session; a no-op when none is stored
    fn clear(&self) -> Result<(), SessionError>;

    /// Bearer token of the current session
    fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.get()?.map(|s| s.token))
    }
}

/// Errors raised by session backends
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
