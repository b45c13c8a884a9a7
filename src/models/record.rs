//! Panel records
//!
//! A [`PanelRecord`] is one cleaned row of the screening panel. Classification
//! wraps it in an [`AnnotatedRecord`] which carries the signature flag from
//! then on; synthetic rows are annotated records too, inheriting the flag of
//! the row they were generated from.

use serde::{Deserialize, Serialize};

use super::fields::{CategoricalField, NumericField, PanelField};
use super::measurement::Measurement;

/// Value used for categorical fields that are missing or blank
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One row of the screening panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordRow", into = "RecordRow")]
pub struct PanelRecord {
    id: String,
    categories: [String; CategoricalField::COUNT],
    measurements: [Measurement; NumericField::COUNT],
}

impl PanelRecord {
    /// Create a record with every categorical field `Unknown` and every measurement absent
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            categories: std::array::from_fn(|_| UNKNOWN_CATEGORY.to_string()),
            measurements: std::array::from_fn(|_| Measurement::Absent),
        }
    }

    /// Set a categorical value
    #[must_use]
    pub fn with_category(mut self, field: CategoricalField, value: impl Into<String>) -> Self {
        self.set_category(field, value);
        self
    }

    /// Set a numeric value
    #[must_use]
    pub fn with_measurement(mut self, field: NumericField, value: impl Into<Measurement>) -> Self {
        self.set_measurement(field, value);
        self
    }

    /// Row identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the row identifier
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Categorical value for a field
    #[must_use]
    pub fn category(&self, field: CategoricalField) -> &str {
        &self.categories[field.index()]
    }

    /// Replace a categorical value
    pub fn set_category(&mut self, field: CategoricalField, value: impl Into<String>) {
        self.categories[field.index()] = value.into();
    }

    /// Measurement for a numeric field
    #[must_use]
    pub fn measurement(&self, field: NumericField) -> &Measurement {
        &self.measurements[field.index()]
    }

    /// Finite numeric value for a field, if present
    #[must_use]
    pub fn value(&self, field: NumericField) -> Option<f64> {
        self.measurement(field).as_f64()
    }

    /// Replace a measurement
    pub fn set_measurement(&mut self, field: NumericField, value: impl Into<Measurement>) {
        self.measurements[field.index()] = value.into();
    }

    /// Composite key of the categorical fields joined with `separator`
    #[must_use]
    pub fn combination_key(&self, separator: &str) -> String {
        self.categories.join(separator)
    }
}

/// A record plus its signature classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    record: PanelRecord,
    #[serde(rename = "signaturePositive", default)]
    signature_positive: bool,
}

impl AnnotatedRecord {
    /// Attach a signature flag to a record
    #[must_use]
    pub const fn new(record: PanelRecord, signature_positive: bool) -> Self {
        Self {
            record,
            signature_positive,
        }
    }

    /// The underlying record
    #[must_use]
    pub const fn record(&self) -> &PanelRecord {
        &self.record
    }

    /// Whether the row matched the clinical signature when it was classified
    #[must_use]
    pub const fn signature_positive(&self) -> bool {
        self.signature_positive
    }

    /// Drop the annotation
    #[must_use]
    pub fn into_record(self) -> PanelRecord {
        self.record
    }
}

impl AsRef<PanelRecord> for PanelRecord {
    fn as_ref(&self) -> &PanelRecord {
        self
    }
}

impl AsRef<PanelRecord> for AnnotatedRecord {
    fn as_ref(&self) -> &PanelRecord {
        &self.record
    }
}

/// Flat serde shape of a record: one key per canonical column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecordRow {
    #[serde(default)]
    id: String,
    #[serde(default = "unknown_category")]
    sex: String,
    #[serde(default = "unknown_category")]
    ethnicity: String,
    #[serde(default)]
    hb: Measurement,
    #[serde(default)]
    mcv: Measurement,
    #[serde(default)]
    mch: Measurement,
    #[serde(default)]
    hba2: Measurement,
    #[serde(default)]
    ferritin: Measurement,
}

fn unknown_category() -> String {
    UNKNOWN_CATEGORY.to_string()
}

impl From<RecordRow> for PanelRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            categories: [row.sex, row.ethnicity],
            measurements: [row.hb, row.mcv, row.mch, row.hba2, row.ferritin],
        }
    }
}

impl From<PanelRecord> for RecordRow {
    fn from(record: PanelRecord) -> Self {
        let [sex, ethnicity] = record.categories;
        let [hb, mcv, mch, hba2, ferritin] = record.measurements;
        Self {
            id: record.id,
            sex,
            ethnicity,
            hb,
            mcv,
            mch,
            hba2,
            ferritin,
        }
    }
}
