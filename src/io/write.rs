//! Exporting annotated rows to CSV and Parquet

use arrow::csv::WriterBuilder;
use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use super::FileFormat;
use crate::error::Result;
use crate::models::{AnnotatedRecord, CategoricalField, Measurement, NumericField};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Flat row layout of exported files
///
/// Non-numeric measurement text has no numeric column to go to and is
/// exported as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub id: String,
    pub sex: String,
    pub ethnicity: String,
    pub hb: Option<f64>,
    pub mcv: Option<f64>,
    pub mch: Option<f64>,
    pub hba2: Option<f64>,
    pub ferritin: Option<f64>,
    pub signature_positive: bool,
}

impl From<&AnnotatedRecord> for ExportRow {
    fn from(annotated: &AnnotatedRecord) -> Self {
        let record = annotated.record();
        let numeric = |field: NumericField| match record.measurement(field) {
            Measurement::Value(v) if v.is_finite() => Some(*v),
            Measurement::Raw(text) => {
                log::debug!("Row {}: dropping non-numeric {field} value '{text}'", record.id());
                None
            }
            _ => None,
        };
        Self {
            id: record.id().to_string(),
            sex: record.category(CategoricalField::Sex).to_string(),
            ethnicity: record.category(CategoricalField::Ethnicity).to_string(),
            hb: numeric(NumericField::Hb),
            mcv: numeric(NumericField::Mcv),
            mch: numeric(NumericField::Mch),
            hba2: numeric(NumericField::HbA2),
            ferritin: numeric(NumericField::Ferritin),
            signature_positive: annotated.signature_positive(),
        }
    }
}

/// Convert annotated rows into one Arrow record batch
pub fn records_to_batch(records: &[AnnotatedRecord]) -> Result<RecordBatch> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    let fields = Vec::<FieldRef>::from_type::<ExportRow>(TracingOptions::default())?;
    Ok(serde_arrow::to_record_batch(&fields, &rows)?)
}

/// Write annotated rows to a CSV or Parquet file, by extension
pub fn write_records(path: &Path, records: &[AnnotatedRecord]) -> Result<()> {
    let start = Instant::now();
    log_operation_start("Writing", path.display());

    let format = FileFormat::from_path(path)?;
    let batch = records_to_batch(records)?;
    let file = File::create(path)?;

    match format {
        FileFormat::Csv => {
            let mut writer = WriterBuilder::new().with_header(true).build(file);
            writer.write(&batch)?;
        }
        FileFormat::Parquet => {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
            writer.write(&batch)?;
            writer.close()?;
        }
    }

    log_operation_complete("wrote", path.display(), records.len(), Some(start.elapsed()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::signature::SignatureClassifier;
    use crate::io::read_annotated;
    use crate::models::PanelRecord;

    fn sample() -> Vec<AnnotatedRecord> {
        vec![
            AnnotatedRecord::new(
                PanelRecord::new("SYN-00001")
                    .with_category(CategoricalField::Sex, "F")
                    .with_category(CategoricalField::Ethnicity, "Nordic, West")
                    .with_measurement(NumericField::Hb, 10.9)
                    .with_measurement(NumericField::Mcv, 64.5)
                    .with_measurement(NumericField::HbA2, 5.25)
                    .with_measurement(NumericField::Ferritin, 88.0),
                true,
            ),
            AnnotatedRecord::new(
                PanelRecord::new("SYN-00002")
                    .with_measurement(NumericField::Hb, 14.1)
                    .with_measurement(NumericField::Mch, Measurement::Raw("clotted".into())),
                false,
            ),
        ]
    }

    #[test]
    fn test_batch_layout() {
        let batch = records_to_batch(&sample()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 9);
        let names: Vec<String> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names[0], "id");
        assert_eq!(names[8], "signature_positive");
    }

    #[test]
    fn test_raw_text_exported_as_null() {
        let rows = sample();
        let exported = ExportRow::from(&rows[1]);
        assert_eq!(exported.mch, None);
        assert_eq!(exported.hb, Some(14.1));
        assert_eq!(exported.sex, "Unknown");
    }

    #[test]
    fn test_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = SignatureClassifier::default();
        let rows = sample();

        for name in ["out.csv", "out.parquet"] {
            let path = dir.path().join(name);
            write_records(&path, &rows).unwrap();
            let back = read_annotated(&path, &classifier).unwrap();

            assert_eq!(back.len(), 2, "{name}");
            assert_eq!(back[0].record().id(), "SYN-00001");
            assert_eq!(back[0].record().category(CategoricalField::Ethnicity), "Nordic, West");
            assert_eq!(back[0].record().value(NumericField::HbA2), Some(5.25));
            assert_eq!(back[0].record().measurement(NumericField::Mch), &Measurement::Absent);
            assert!(back[0].signature_positive());
            assert!(!back[1].signature_positive());
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_records(&dir.path().join("out.xlsx"), &sample()).is_err());
    }
}
