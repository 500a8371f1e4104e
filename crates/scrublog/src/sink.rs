//! Log sinks
//!
//! A sink consumes finished [`LogRecord`]s. Sinks are the only resource
//! shared across in-flight requests, so implementations must tolerate
//! interleaved calls; each call hands over one complete, self-contained
//! record.

use crate::record::{Level, LogRecord};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Error type for sink operations.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// IO error while persisting a record.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sink is closed or unavailable.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Trait for log-record consumers.
///
/// Implement this to route records to custom destinations.
pub trait LogSink: Send + Sync + 'static {
    /// Consume one record.
    fn log(&self, record: &LogRecord) -> Result<(), SinkError>;

    /// Flush any buffered records.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that re-emits records as `tracing` events at the record level.
///
/// The structured fields are rendered as one JSON object per event, so
/// any `tracing` subscriber (fmt, JSON, OpenTelemetry) sees the full
/// record.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl TracingSink {
    /// Create a new tracing sink
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn log(&self, record: &LogRecord) -> Result<(), SinkError> {
        let fields = Value::Object(record.fields.clone());
        match record.level {
            Level::Debug => tracing::debug!(target: "scrublog", fields = %fields, "{}", record.message),
            Level::Info => tracing::info!(target: "scrublog", fields = %fields, "{}", record.message),
            Level::Warn => tracing::warn!(target: "scrublog", fields = %fields, "{}", record.message),
            Level::Error => tracing::error!(target: "scrublog", fields = %fields, "{}", record.message),
        }
        Ok(())
    }
}

/// Sink that appends records to a file as JSON lines.
///
/// Each record is one JSON object per line, compatible with common log
/// shippers. Writes are serialized through a mutex so concurrent
/// emission never interleaves lines.
pub struct FileSink {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl FileSink {
    /// Create or append to the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    /// The file records are appended to
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Clone for FileSink {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl LogSink for FileSink {
    fn log(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(&record.to_json())?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|err| SinkError::Unavailable(err.to_string()))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|err| SinkError::Unavailable(err.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

/// Sink that keeps records in memory.
///
/// Intended for tests and assertions on emitted records.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Create an empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record received so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of records received
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// True if no record has been received
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn log(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|err| SinkError::Unavailable(err.to_string()))?
            .push(record.clone());
        Ok(())
    }
}
