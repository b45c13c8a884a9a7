//! Data model for screening panel records
//!
//! Canonical fields, coerced measurements, records and the cleaning step
//! that turns source rows into records.

pub mod cleaning;
pub mod fields;
pub mod measurement;
pub mod record;

pub use cleaning::{ColumnMapping, ColumnRole, RecordCleaner};
pub use fields::{CategoricalField, NumericField, PanelField};
pub use measurement::Measurement;
pub use record::{AnnotatedRecord, PanelRecord, UNKNOWN_CATEGORY};
