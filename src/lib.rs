//! Synthetic record generation for clinical screening panels.
//!
//! Source rows are classified against a clinical signature, synthesized with
//! calibrated noise and resampled categorical values, and the synthetic set
//! is scored for distributional similarity and disclosure risk.

extern crate self as labsynth;

pub mod algorithm;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod utils;

// Core types
pub use config::SynthConfig;
pub use error::{Result, SynthError};
pub use models::{AnnotatedRecord, CategoricalField, Measurement, NumericField, PanelField, PanelRecord};

// Generation
pub use algorithm::noise::{FieldNoiseProfile, NoiseCalibrator, NoiseRange, NoiseSettings};
pub use algorithm::sampling::CategoricalDistribution;
pub use algorithm::signature::{SignatureClassifier, SignatureRules};
pub use algorithm::synthesis::{
    GenerationBackend, GenerationRequest, GenerationResponse, RecordSynthesizer, available_backend,
    backend_from_config,
};

// Scoring
pub use algorithm::privacy::{PrivacyAssessment, PrivacyScorer, RareCombination};
pub use algorithm::quality::{HistogramBin, QualityScorer, ValueRange, histogram, overlap};
pub use algorithm::report::{PrivacyReport, ReportBuilder};

// File access
pub use io::{load_records_async, read_annotated, read_records, write_records};
