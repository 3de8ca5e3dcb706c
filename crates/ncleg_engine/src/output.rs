//! Where parsed records go.

use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use ncleg_core::BillRecord;
use serde::Serialize;

use crate::harvest::{ChamberSummary, RunSummary};
use crate::persist::{AtomicFileWriter, PersistError};

pub const DEFAULT_RECORDS_FILENAME: &str = "bills.json";
pub const DEFAULT_MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Receives every parsed record, then the run summary once at the end.
pub trait RecordSink: Send {
    fn accept(&mut self, record: &BillRecord) -> Result<(), OutputError>;

    /// Flushes whatever was buffered. Returns the files written, if any.
    fn finish(&mut self, summary: &RunSummary) -> Result<Vec<PathBuf>, OutputError>;
}

/// One JSON object per line, written as records arrive.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    written: usize,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn accept(&mut self, record: &BillRecord) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<Vec<PathBuf>, OutputError> {
        self.writer.flush()?;
        Ok(Vec::new())
    }
}

/// Collects records and writes them as one JSON array on `finish`, with an
/// optional manifest next to it.
pub struct JsonFileSink {
    writer: AtomicFileWriter,
    records_filename: String,
    manifest_filename: Option<String>,
    records: Vec<BillRecord>,
}

impl JsonFileSink {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            records_filename: DEFAULT_RECORDS_FILENAME.to_string(),
            manifest_filename: Some(DEFAULT_MANIFEST_FILENAME.to_string()),
            records: Vec::new(),
        }
    }

    pub fn with_records_filename(mut self, name: impl Into<String>) -> Self {
        self.records_filename = name.into();
        self
    }

    pub fn with_manifest_filename(mut self, name: Option<String>) -> Self {
        self.manifest_filename = name;
        self
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_utc: String,
    records_file: &'a str,
    record_count: usize,
    chambers: &'a [ChamberSummary],
}

impl RecordSink for JsonFileSink {
    fn accept(&mut self, record: &BillRecord) -> Result<(), OutputError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<Vec<PathBuf>, OutputError> {
        let body = serde_json::to_vec_pretty(&self.records)?;
        let mut written = vec![self.writer.write(&self.records_filename, &body)?];

        if let Some(name) = &self.manifest_filename {
            let manifest = Manifest {
                generated_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                records_file: &self.records_filename,
                record_count: self.records.len(),
                chambers: &summary.chambers,
            };
            let body = serde_json::to_vec_pretty(&manifest)?;
            written.push(self.writer.write(name, &body)?);
        }
        Ok(written)
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<BillRecord>,
}

impl RecordSink for MemorySink {
    fn accept(&mut self, record: &BillRecord) -> Result<(), OutputError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<Vec<PathBuf>, OutputError> {
        Ok(Vec::new())
    }
}
