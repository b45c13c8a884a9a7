//! Loading panel rows from CSV and Parquet files

use arrow::array::Array;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::{DEFAULT_BATCH_SIZE, FileFormat};
use crate::algorithm::signature::SignatureClassifier;
use crate::error::Result;
use crate::models::{AnnotatedRecord, ColumnMapping, PanelRecord, RecordCleaner};
use crate::models::fields::normalize_header;
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Normalized header of the exported signature flag column
const SIGNATURE_HEADER: &str = "signaturepositive";

/// Read a file into Arrow record batches
///
/// CSV columns are all read as text so that coercion happens in one place.
pub fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading", path.display());

    let batches = match FileFormat::from_path(path)? {
        FileFormat::Csv => read_csv(path)?,
        FileFormat::Parquet => read_parquet(path)?,
    };

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("read", path.display(), rows, Some(start.elapsed()));
    Ok(batches)
}

fn read_csv(path: &Path) -> Result<Vec<RecordBatch>> {
    let mut file = File::open(path)?;
    let (inferred, _) = Format::default().with_header(true).infer_schema(&mut file, Some(100))?;
    file.seek(SeekFrom::Start(0))?;

    let text_fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| Field::new(field.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(text_fields));

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build(file)?;
    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build()?;
    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn headers(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect()
}

fn row_cells(batch: &RecordBatch, row: usize) -> Result<Vec<String>> {
    batch
        .columns()
        .iter()
        .map(|column| {
            if column.is_null(row) {
                Ok(String::new())
            } else {
                Ok(array_value_to_string(column.as_ref(), row)?)
            }
        })
        .collect()
}

/// Convert batches into cleaned records
///
/// Each batch's headers are reconciled separately; identifiers are kept
/// unique across all batches handled by the same `cleaner`.
pub fn batches_to_records(batches: &[RecordBatch], cleaner: &mut RecordCleaner) -> Result<Vec<PanelRecord>> {
    let mut records = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    for batch in batches {
        let mapping = ColumnMapping::from_headers(&headers(batch));
        if !mapping.missing_numeric().is_empty() {
            log::debug!("No column for {:?}; those values will be absent", mapping.missing_numeric());
        }
        for row in 0..batch.num_rows() {
            let cells = row_cells(batch, row)?;
            records.push(cleaner.clean_row(&mapping, &cells));
        }
    }
    Ok(records)
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Convert batches into annotated records
///
/// Rows keep a stored signature flag when the data has one (as written by
/// [`write_records`](super::write_records)); other rows are classified.
pub fn batches_to_annotated(
    batches: &[RecordBatch],
    cleaner: &mut RecordCleaner,
    classifier: &SignatureClassifier,
) -> Result<Vec<AnnotatedRecord>> {
    let mut annotated = Vec::new();
    for batch in batches {
        let records = batches_to_records(std::slice::from_ref(batch), cleaner)?;
        let flag_column = headers(batch)
            .iter()
            .position(|header| normalize_header(header) == SIGNATURE_HEADER);

        for (row, record) in records.into_iter().enumerate() {
            let stored = match flag_column {
                Some(col) => {
                    let column = batch.column(col);
                    if column.is_null(row) {
                        None
                    } else {
                        parse_flag(&array_value_to_string(column.as_ref(), row)?)
                    }
                }
                None => None,
            };
            let positive = stored.unwrap_or_else(|| classifier.classify(&record));
            annotated.push(AnnotatedRecord::new(record, positive));
        }
    }
    Ok(annotated)
}

/// Read and clean all rows of a file
pub fn read_records(path: &Path) -> Result<Vec<PanelRecord>> {
    let batches = read_batches(path)?;
    let records = batches_to_records(&batches, &mut RecordCleaner::new())?;
    if records.is_empty() {
        log_warning("No rows found", Some(&path.display()));
    }
    Ok(records)
}

/// Read a file into annotated rows, classifying rows without a stored flag
pub fn read_annotated(path: &Path, classifier: &SignatureClassifier) -> Result<Vec<AnnotatedRecord>> {
    let batches = read_batches(path)?;
    batches_to_annotated(&batches, &mut RecordCleaner::new(), classifier)
}
