//! Record sink trait and in-memory implementation
//!
//! This module defines the interface every emitted record goes through.

use crate::record::CanonicalRecord;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for finished records
///
/// Append-only. Records arrive from several workers, so no ordering is
/// guaranteed and implementations must be thread-safe. A sink must accept
/// every valid record.
pub trait RecordSink: Send + Sync {
    /// Appends one record
    fn emit(&self, record: &CanonicalRecord) -> OutputResult<()>;

    /// Flushes anything buffered; called once when the crawl ends
    fn finish(&self) -> OutputResult<()> {
        Ok(())
    }
}

/// Keeps emitted records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CanonicalRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything emitted so far
    pub fn records(&self) -> Vec<CanonicalRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: &CanonicalRecord) -> OutputResult<()> {
        self.records
            .lock()
            .map_err(|e| OutputError::Write(format!("Record buffer poisoned: {}", e)))?
            .push(record.clone());
        Ok(())
    }
}
