//! Async wrappers around the blocking readers and writers
//!
//! File decoding runs on the tokio blocking pool; several files are read
//! concurrently and cleaned in input order.

use arrow::record_batch::RecordBatch;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};

use super::read::{batches_to_records, read_batches, read_records};
use super::write::write_records;
use crate::error::{Result, SynthError};
use crate::models::{AnnotatedRecord, PanelRecord, RecordCleaner};

fn join_error(e: tokio::task::JoinError) -> SynthError {
    SynthError::Io(std::io::Error::other(format!("blocking task failed: {e}")))
}

/// Read and clean one file without blocking the runtime
pub async fn read_records_async(path: &Path) -> Result<Vec<PanelRecord>> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_records(&path))
        .await
        .map_err(join_error)?
}

async fn read_batches_async(path: PathBuf) -> Result<Vec<RecordBatch>> {
    tokio::task::spawn_blocking(move || read_batches(&path))
        .await
        .map_err(join_error)?
}

/// Read several files concurrently into one cleaned dataset
///
/// Identifiers stay unique across files; rows keep the order of `paths`.
pub async fn load_records_async(paths: &[PathBuf]) -> Result<Vec<PanelRecord>> {
    let per_file = try_join_all(paths.iter().cloned().map(read_batches_async)).await?;

    let mut cleaner = RecordCleaner::new();
    let mut records = Vec::new();
    for batches in &per_file {
        records.extend(batches_to_records(batches, &mut cleaner)?);
    }
    log::info!("Loaded {} rows from {} files", records.len(), paths.len());
    Ok(records)
}

/// Write rows without blocking the runtime
pub async fn write_records_async(path: &Path, records: Vec<AnnotatedRecord>) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_records(&path, &records))
        .await
        .map_err(join_error)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NumericField;

    #[tokio::test]
    async fn test_load_several_files_keeps_ids_unique() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        std::fs::write(&first, "id,hb\nP1,11.0\nP2,12.5\n").unwrap();
        std::fs::write(&second, "sample_id,hemoglobin\nP1,9.8\n").unwrap();

        let records = load_records_async(&[first.clone(), second]).await.unwrap();
        let ids: Vec<&str> = records.iter().map(PanelRecord::id).collect();
        assert_eq!(ids, vec!["P1", "P2", "P1-2"]);
        assert_eq!(records[2].value(NumericField::Hb), Some(9.8));

        let single = read_records_async(&first).await.unwrap();
        assert_eq!(single.len(), 2);
    }

    #[tokio::test]
    async fn test_write_async_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.parquet");
        let rows = vec![AnnotatedRecord::new(
            PanelRecord::new("X").with_measurement(NumericField::Mcv, 71.0),
            false,
        )];
        write_records_async(&path, rows).await.unwrap();
        let back = read_records_async(&path).await.unwrap();
        assert_eq!(back[0].value(NumericField::Mcv), Some(71.0));
    }

    #[tokio::test]
    async fn test_one_failing_file_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("ok.csv");
        std::fs::write(&good, "id,hb\nP1,11.0\n").unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(load_records_async(&[good, missing]).await.is_err());
    }
}
