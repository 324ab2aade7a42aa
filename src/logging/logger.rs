//! Scoped logger

use super::{threshold, Level, LogSink, Metadata, TracingSink};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;

/// Separator between parent and child scopes
pub const SCOPE_SEPARATOR: &str = ":";

/// Severity-filtered logger with a hierarchical scope.
///
/// Cloning is cheap; clones share the same sink.
#[derive(Clone)]
pub struct Logger {
    scope: String,
    sink: Arc<dyn LogSink>,
    threshold: Option<Level>,
}

impl Logger {
    /// Logger writing to `tracing`, filtered by the process-wide threshold
    pub fn new(scope: impl Into<String>) -> Self {
        Self::with_sink(scope, Arc::new(TracingSink))
    }

    pub fn with_sink(scope: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            scope: scope.into(),
            sink,
            threshold: None,
        }
    }

    /// Pin this logger (and its children) to a fixed threshold instead of
    /// the process-wide one
    pub fn with_threshold(mut self, level: Level) -> Self {
        self.threshold = Some(level);
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Logger whose scope is `<parent>:<scope>`
    pub fn child(&self, scope: &str) -> Logger {
        let scope = if self.scope.is_empty() {
            scope.to_string()
        } else {
            format!("{}{}{}", self.scope, SCOPE_SEPARATOR, scope)
        };

        Logger {
            scope,
            sink: Arc::clone(&self.sink),
            threshold: self.threshold,
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level.weight() >= self.threshold.unwrap_or_else(threshold).weight()
    }

    pub fn debug(&self, message: &str, metadata: Option<Metadata>) {
        self.log(Level::Debug, message, metadata);
    }

    pub fn info(&self, message: &str, metadata: Option<Metadata>) {
        self.log(Level::Info, message, metadata);
    }

    pub fn warn(&self, message: &str, metadata: Option<Metadata>) {
        self.log(Level::Warn, message, metadata);
    }

    pub fn error(&self, message: &str, metadata: Option<Metadata>) {
        self.log(Level::Error, message, metadata);
    }

    pub fn log(&self, level: Level, message: &str, metadata: Option<Metadata>) {
        if !self.enabled(level) {
            return;
        }

        let line = format_line(Utc::now(), &self.scope, message);
        let metadata = metadata.filter(|m| !m.is_empty());
        self.sink.emit(level, &line, metadata.as_ref());
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("scope", &self.scope)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

/// Render `<timestamp> [<scope>] <message>`; the label is omitted for an
/// empty scope.
pub fn format_line(timestamp: DateTime<Utc>, scope: &str, message: &str) -> String {
    let timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    if scope.is_empty() {
        format!("{timestamp} {message}")
    } else {
        format!("{timestamp} [{scope}] {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use chrono::TimeZone;

    fn capture(scope: &str, level: Level) -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::with_sink(scope, sink.clone()).with_threshold(level);
        (logger, sink)
    }

    #[test]
    fn test_format_line() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            format_line(ts, "admin-console", "fetch completed"),
            "2024-01-01T00:00:00.000Z [admin-console] fetch completed"
        );
        assert_eq!(format_line(ts, "", "bare"), "2024-01-01T00:00:00.000Z bare");
    }

    #[test]
    fn test_error_threshold_suppresses_lower_levels() {
        let (logger, sink) = capture("upload", Level::Error);

        logger.debug("verbose event", None);
        logger.info("upload started", None);
        logger.warn("slow chunk", None);
        assert!(sink.records().is_empty());

        logger.error("upload failed", None);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Error);
        assert!(records[0].line.ends_with(" [upload] upload failed"));
    }

    #[test]
    fn test_info_threshold_skips_debug() {
        let (logger, sink) = capture("admin-console", Level::Info);

        logger.debug("verbose event", None);
        logger.info("fetch completed", None);

        assert!(sink.at(Level::Debug).is_empty());
        assert_eq!(sink.at(Level::Info).len(), 1);
    }

    #[test]
    fn test_child_scopes_join_with_colon() {
        let (logger, sink) = capture("a", Level::Debug);

        let nested = logger.child("b");
        assert_eq!(nested.scope(), "a:b");

        nested.warn("request timeout", None);
        let line = &sink.records()[0].line;
        assert!(line.ends_with(" [a:b] request timeout"), "got {line}");
    }

    #[test]
    fn test_child_of_unscoped_logger() {
        let (logger, _) = capture("", Level::Debug);
        assert_eq!(logger.child("http").scope(), "http");
    }

    #[test]
    fn test_metadata_is_passed_separately() {
        let (logger, sink) = capture("admin-console", Level::Debug);

        logger.info("fetch completed", Some(Metadata::new().with("duration", 123)));
        logger.info("no metadata", Some(Metadata::new()));

        let records = sink.records();
        assert!(!records[0].line.contains("duration"));
        assert_eq!(
            records[0].metadata,
            Some(Metadata::new().with("duration", 123))
        );
        // Empty maps are dropped rather than forwarded
        assert_eq!(records[1].metadata, None);
    }

    #[test]
    fn test_timestamp_prefix_is_iso8601() {
        let (logger, sink) = capture("scope", Level::Debug);
        logger.info("hello", None);

        let line = sink.records()[0].line.clone();
        let (timestamp, rest) = line.split_once(' ').unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert_eq!(rest, "[scope] hello");
    }
}
