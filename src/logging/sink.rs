//! Output sinks for formatted log records

use super::{Level, Metadata};
use std::sync::{Mutex, PoisonError};

/// Destination for formatted log lines.
///
/// The line already carries the timestamp and scope label. Metadata is
/// handed over separately and is `None` when the caller supplied nothing or
/// an empty map.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: Level, line: &str, metadata: Option<&Metadata>);
}

/// Forwards records to `tracing` at the matching level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: Level, line: &str, metadata: Option<&Metadata>) {
        let metadata = metadata.map(Metadata::to_string);
        let metadata = metadata.as_deref();

        match level {
            Level::Debug => tracing::debug!(metadata, "{line}"),
            Level::Info => tracing::info!(metadata, "{line}"),
            Level::Warn => tracing::warn!(metadata, "{line}"),
            Level::Error => tracing::error!(metadata, "{line}"),
        }
    }
}

/// A record captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub line: String,
    pub metadata: Option<Metadata>,
}

/// Keeps every record in memory, for inspection by embedders and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CapturedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records emitted so far
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records at exactly `level`
    pub fn at(&self, level: Level) -> Vec<CapturedRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: Level, line: &str, metadata: Option<&Metadata>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedRecord {
                level,
                line: line.to_string(),
                metadata: metadata.cloned(),
            });
    }
}
