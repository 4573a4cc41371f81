//! Append-only JSON-lines audit file.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use super::{AuditError, AuditRecord, AuditSink};

/// Writes one JSON object per line and flushes after every record.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read back every record in the file (a missing file reads as empty).
    pub fn read_all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)
            .map_err(|e| AuditError::Io(format!("failed to open audit log: {e}")))?;

        let mut out = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| AuditError::Io(format!("failed to read audit log: {e}")))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|e| AuditError::Serialize(format!("bad audit line: {e}")))?;
            out.push(record);
        }
        Ok(out)
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record).map_err(|e| AuditError::Serialize(e.to_string()))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuditError::Unavailable("audit file lock poisoned".to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditError::Io(format!("failed to open audit log: {e}")))?;

        writeln!(file, "{line}").map_err(|e| AuditError::Io(format!("failed to write audit record: {e}")))?;
        file.flush()
            .map_err(|e| AuditError::Io(format!("failed to flush audit log: {e}")))?;
        Ok(())
    }
}
