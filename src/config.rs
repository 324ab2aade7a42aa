//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::logging::{self, Level};
use crate::session::FileSessionStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable names
pub const ENV_API_BASE_URL: &str = "RAG_ADMIN_API_BASE_URL";
pub const ENV_API_KEY: &str = "RAG_ADMIN_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "RAG_ADMIN_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "RAG_ADMIN_SESSION_FILE";
pub const ENV_LOG_LEVEL: &str = "RAG_ADMIN_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "RAG_ADMIN_LOG_FORMAT";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static key for server-to-server style calls
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Clear the session and return to login on any 401
    #[serde(default = "default_session_guard")]
    pub session_guard: bool,
}

fn default_base_url() -> String {
    crate::http::DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    crate::http::DEFAULT_TIMEOUT.as_secs()
}

fn default_session_guard() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout(),
            session_guard: default_session_guard(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Session file; defaults to the user data directory
    pub file: Option<String>,
}

impl SessionConfig {
    pub fn path(&self) -> PathBuf {
        self.file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(FileSessionStore::default_path)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Threshold override; unset means the build default
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Threshold for [`logging::init`]
    pub fn threshold(&self) -> Level {
        logging::resolve_level(self.level.as_deref(), logging::is_production_build())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("rag-admin").join("config.toml")),
            Some(PathBuf::from("./rag-admin.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|s| s.parse().ok()) {
            self.api.timeout_secs = secs;
        }

        // Session overrides
        if let Some(file) = lookup(ENV_SESSION_FILE) {
            self.session.file = Some(file);
        }

        // Logging overrides
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = Some(level);
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# RAG Admin Configuration
#
# Environment variables override these settings:
# - RAG_ADMIN_API_BASE_URL
# - RAG_ADMIN_API_KEY
# - RAG_ADMIN_TIMEOUT_SECS
# - RAG_ADMIN_SESSION_FILE
# - RAG_ADMIN_LOG_LEVEL
# - RAG_ADMIN_LOG_FORMAT

[api]
# Backend base URL
base_url = "http://localhost:8000"

# Static API key, sent when no login session exists
# api_key = ""

# Request timeout in seconds (FAQ import generates embeddings and is slow)
timeout_secs = 300

# Clear the stored session and ask for a new login on any 401
session_guard = true

[session]
# Where the login token is kept
# file = "~/.local/share/rag-admin/session.json"

[logging]
# Log level: debug, info, warn, error (default: info, or warn in release builds)
# level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
