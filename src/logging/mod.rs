//! Structured Logger
//!
//! Severity-filtered, hierarchically scoped diagnostic output.
//!
//! ## Threshold
//!
//! One process-wide threshold, set once with [`init`] at startup. Until
//! `init` is called the build default applies: `info` in debug builds and
//! `warn` in release builds. A [`Logger`] can also be pinned to its own
//! threshold with [`Logger::with_threshold`].
//!
//! ## Output
//!
//! Each record is rendered as `<ISO-8601 timestamp> [<scope>] <message>` and
//! handed to a [`LogSink`] together with its metadata. The default sink
//! forwards to `tracing`; nothing is buffered.

mod level;
mod logger;
mod metadata;
mod sink;

pub use level::{Level, ParseLevelError};
pub use logger::{format_line, Logger, SCOPE_SEPARATOR};
pub use metadata::{MetaValue, Metadata};
pub use sink::{CapturedRecord, LogSink, MemorySink, TracingSink};

use std::sync::OnceLock;

/// Root scope used by the crate's own loggers
pub const ROOT_SCOPE: &str = "rag-admin";

static THRESHOLD: OnceLock<Level> = OnceLock::new();

/// Set the process-wide threshold.
///
/// Only the first call takes effect; returns `false` if a threshold was
/// already set.
pub fn init(level: Level) -> bool {
    THRESHOLD.set(level).is_ok()
}

/// The process-wide threshold
pub fn threshold() -> Level {
    THRESHOLD
        .get()
        .copied()
        .unwrap_or_else(|| resolve_level(None, is_production_build()))
}

/// Resolve the threshold from an optional override.
///
/// An override naming a level (any case) wins; anything else falls back to
/// `warn` for production builds and `info` otherwise.
pub fn resolve_level(override_value: Option<&str>, production: bool) -> Level {
    if let Some(level) = override_value.and_then(|v| v.parse().ok()) {
        return level;
    }

    if production {
        Level::Warn
    } else {
        Level::Info
    }
}

pub fn is_production_build() -> bool {
    !cfg!(debug_assertions)
}

/// Root logger for the crate
pub fn root() -> Logger {
    Logger::new(ROOT_SCOPE)
}
