//! JSON-lines record output
//!
//! One serialized [`CanonicalRecord`] per line, appended to a file.

use super::traits::{OutputError, OutputResult, RecordSink};
use crate::record::CanonicalRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Appends records to a JSON-lines file
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Opens (or creates) the file at `path` in append mode
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&self, record: &CanonicalRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Writer poisoned: {}", e)))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&self) -> OutputResult<()> {
        self.writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Writer poisoned: {}", e)))?
            .flush()?;
        Ok(())
    }
}
