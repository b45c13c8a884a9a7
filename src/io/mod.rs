//! Reading and writing panel files
//!
//! CSV and Parquet are supported, chosen by file extension. Reading goes
//! through Arrow record batches, header reconciliation and the
//! [`RecordCleaner`](crate::models::RecordCleaner); writing converts rows to a
//! flat serde type and from there to Arrow with `serde_arrow`.

pub mod async_io;
pub mod read;
pub mod write;

use std::path::Path;

use crate::error::{Result, SynthError};

pub use async_io::{load_records_async, read_records_async, write_records_async};
pub use read::{batches_to_annotated, batches_to_records, read_annotated, read_batches, read_records};
pub use write::{ExportRow, records_to_batch, write_records};

/// Default number of rows per Arrow batch
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated text with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl FileFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("parquet" | "pq") => Ok(Self::Parquet),
            _ => Err(SynthError::Config(format!(
                "unsupported file type: {} (expected .csv or .parquet)",
                path.display()
            ))),
        }
    }
}
