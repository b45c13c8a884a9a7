//! Synthetic record generation
//!
//! [`RecordSynthesizer`] walks the annotated source rows cyclically and
//! derives one synthetic row per output index: numeric fields get calibrated
//! noise, categorical fields are resampled from the empirical distributions,
//! and the base row's signature flag is carried over unchanged.

pub mod backend;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::algorithm::noise::NoiseCalibrator;
use crate::algorithm::sampling::CategoricalDistribution;
use crate::error::{Result, SynthError};
use crate::models::{AnnotatedRecord, CategoricalField, NumericField, PanelField, PanelRecord};
use crate::utils::logging::{
    create_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
};
use crate::utils::stats;

pub use backend::{
    BackendSettings, FallbackBackend, GenerationBackend, GenerationRequest, GenerationResponse,
    LocalBackend, RemoteBackend, available_backend, backend_from_config,
};

/// Settings for row synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// Prefix of generated identifiers
    pub id_prefix: String,
    /// Zero-padded width of the sequence number in generated identifiers
    pub id_width: usize,
    /// Weight multiplier for the base row's own categorical value on signature-positive rows
    pub bias_factor: f64,
    /// Draw a progress bar while generating
    pub show_progress: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            id_prefix: "SYN".to_string(),
            id_width: 5,
            bias_factor: 1.4,
            show_progress: false,
        }
    }
}

impl SynthesisSettings {
    /// Identifier for the output row at `index` (numbering starts at 1)
    #[must_use]
    pub fn synthetic_id(&self, index: usize) -> String {
        format!("{}-{:0width$}", self.id_prefix, index + 1, width = self.id_width)
    }
}

/// Convert a caller-supplied row count, rejecting values that are not positive
pub fn requested_count(rows: i64) -> Result<usize> {
    usize::try_from(rows)
        .ok()
        .filter(|&n| n > 0)
        .ok_or(SynthError::InvalidCount(rows))
}

/// Generates synthetic rows from annotated source rows
#[derive(Debug, Clone, Default)]
pub struct RecordSynthesizer {
    calibrator: NoiseCalibrator,
    settings: SynthesisSettings,
}

impl RecordSynthesizer {
    /// Create a synthesizer
    #[must_use]
    pub const fn new(calibrator: NoiseCalibrator, settings: SynthesisSettings) -> Self {
        Self {
            calibrator,
            settings,
        }
    }

    /// The noise calibrator in use
    #[must_use]
    pub const fn calibrator(&self) -> &NoiseCalibrator {
        &self.calibrator
    }

    /// The synthesis settings in use
    #[must_use]
    pub const fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Generate exactly `count` synthetic rows
    ///
    /// # Arguments
    /// * `records` - Annotated source rows
    /// * `count` - Number of rows to produce
    /// * `rng` - Random source; seed it for reproducible output
    ///
    /// # Returns
    /// Rows with fresh sequential identifiers; row `i` is derived from
    /// `records[i % records.len()]` and carries its signature flag.
    ///
    /// # Errors
    /// [`SynthError::InvalidCount`] when `count` is zero and
    /// [`SynthError::EmptyDataset`] when there are no source rows.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        records: &[AnnotatedRecord],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<AnnotatedRecord>> {
        if count == 0 {
            return Err(SynthError::InvalidCount(0));
        }
        if records.is_empty() {
            return Err(SynthError::EmptyDataset);
        }

        let start = Instant::now();
        log_operation_start(
            "Generating synthetic rows from",
            format!("{} source rows", records.len()),
        );

        let means = field_means(records);
        let distributions =
            CategoricalField::ALL.map(|field| CategoricalDistribution::from_records(records, field));

        let pb = create_progress_bar(count as u64, Some("Generating rows"), self.settings.show_progress);
        let mut synthetic = Vec::with_capacity(count);
        for i in 0..count {
            let base = &records[i % records.len()];
            synthetic.push(self.synthesize_row(i, base, &means, &distributions, rng));
            pb.inc(1);
        }
        finish_progress_bar(&pb, Some("Generation complete"));

        let positives = synthetic.iter().filter(|r| r.signature_positive()).count();
        log::debug!("{positives} of {count} synthetic rows inherit a positive signature");
        log_operation_complete("generated", "synthetic dataset", synthetic.len(), Some(start.elapsed()));
        Ok(synthetic)
    }

    fn synthesize_row<R: Rng + ?Sized>(
        &self,
        index: usize,
        base: &AnnotatedRecord,
        means: &[f64; NumericField::COUNT],
        distributions: &[CategoricalDistribution],
        rng: &mut R,
    ) -> AnnotatedRecord {
        let preserve = base.signature_positive();
        let source = base.record();
        let mut record = PanelRecord::new(self.settings.synthetic_id(index));

        for field in NumericField::ALL {
            // Non-numeric text is treated like a missing value here
            let value = source.value(field).unwrap_or(means[field.index()]);
            let perturbed = self.calibrator.perturb_value(field, value, preserve, rng);
            record.set_measurement(field, perturbed);
        }

        for (field, distribution) in CategoricalField::ALL.into_iter().zip(distributions) {
            let value = if preserve {
                distribution.sample_biased(source.category(field), self.settings.bias_factor, rng)
            } else {
                distribution.sample(rng).to_string()
            };
            record.set_category(field, value);
        }

        AnnotatedRecord::new(record, preserve)
    }
}

/// Mean of every numeric field over the rows where it is present, 0 when it never is
#[must_use]
pub fn field_means<R: AsRef<PanelRecord>>(records: &[R]) -> [f64; NumericField::COUNT] {
    NumericField::ALL.map(|field| {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|r| r.as_ref().value(field))
            .collect();
        stats::mean(&values).unwrap_or(0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::noise::NoiseSettings;
    use crate::models::{Measurement, UNKNOWN_CATEGORY};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rustc_hash::FxHashSet;

    fn source_rows() -> Vec<AnnotatedRecord> {
        (0..4)
            .map(|i| {
                let record = PanelRecord::new(format!("P{i}"))
                    .with_category(CategoricalField::Sex, if i % 2 == 0 { "F" } else { "M" })
                    .with_category(CategoricalField::Ethnicity, "Nordic")
                    .with_measurement(NumericField::Hb, 10.0 + f64::from(i))
                    .with_measurement(NumericField::Mcv, 70.0 + f64::from(i) * 5.0)
                    .with_measurement(NumericField::Mch, 25.0)
                    .with_measurement(NumericField::HbA2, 4.0)
                    .with_measurement(NumericField::Ferritin, 60.0);
                AnnotatedRecord::new(record, i == 1)
            })
            .collect()
    }

    fn zero_noise() -> RecordSynthesizer {
        RecordSynthesizer::new(
            NoiseCalibrator::new(NoiseSettings::default().with_noise_fraction(0.0)),
            SynthesisSettings::default(),
        )
    }

    #[test]
    fn test_generates_exact_count_with_unique_ids() {
        let synthesizer = RecordSynthesizer::default();
        let mut rng = StdRng::seed_from_u64(1);
        let rows = synthesizer.generate(&source_rows(), 37, &mut rng).unwrap();
        assert_eq!(rows.len(), 37);
        let ids: FxHashSet<&str> = rows.iter().map(|r| r.record().id()).collect();
        assert_eq!(ids.len(), 37);
        assert_eq!(rows[0].record().id(), "SYN-00001");
        assert_eq!(rows[36].record().id(), "SYN-00037");
    }

    #[test]
    fn test_flags_follow_cyclic_base_rows() {
        let source = source_rows();
        let mut rng = StdRng::seed_from_u64(2);
        let rows = RecordSynthesizer::default().generate(&source, 10, &mut rng).unwrap();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.signature_positive(), source[i % source.len()].signature_positive());
        }
    }

    #[test]
    fn test_rejects_empty_and_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let synthesizer = RecordSynthesizer::default();
        assert!(matches!(synthesizer.generate(&[], 5, &mut rng), Err(SynthError::EmptyDataset)));
        assert!(matches!(
            synthesizer.generate(&source_rows(), 0, &mut rng),
            Err(SynthError::InvalidCount(0))
        ));
    }

    #[test]
    fn test_requested_count() {
        assert_eq!(requested_count(12).unwrap(), 12);
        assert!(matches!(requested_count(0), Err(SynthError::InvalidCount(0))));
        assert!(matches!(requested_count(-4), Err(SynthError::InvalidCount(-4))));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let source = source_rows();
        let synthesizer = RecordSynthesizer::default();
        let a = synthesizer.generate(&source, 8, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = synthesizer.generate(&source, 8, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_absent_values_use_field_mean() {
        let mut source = source_rows();
        let mut record = source[0].record().clone();
        record.set_measurement(NumericField::Hb, Measurement::Absent);
        source[0] = AnnotatedRecord::new(record, false);

        // Present hb values are 11, 12, 13
        let means = field_means(&source);
        assert_eq!(means[NumericField::Hb.index()], 12.0);

        let mut rng = StdRng::seed_from_u64(4);
        let rows = zero_noise().generate(&source, 1, &mut rng).unwrap();
        assert_eq!(rows[0].record().value(NumericField::Hb), Some(12.0));
    }

    #[test]
    fn test_field_mean_is_zero_when_never_present() {
        let rows = vec![PanelRecord::new("a"), PanelRecord::new("b")];
        assert_eq!(field_means(&rows), [0.0; NumericField::COUNT]);
    }

    #[test]
    fn test_zero_noise_reproduces_base_values() {
        let source = source_rows();
        let mut rng = StdRng::seed_from_u64(5);
        let rows = zero_noise().generate(&source, 4, &mut rng).unwrap();
        for (row, base) in rows.iter().zip(&source) {
            for field in NumericField::ALL {
                assert_eq!(row.record().value(field), base.record().value(field));
            }
        }
    }

    #[test]
    fn test_categories_come_from_source_values() {
        let source = source_rows();
        let mut rng = StdRng::seed_from_u64(6);
        let rows = RecordSynthesizer::default().generate(&source, 50, &mut rng).unwrap();
        for row in &rows {
            assert!(["F", "M"].contains(&row.record().category(CategoricalField::Sex)));
            assert_eq!(row.record().category(CategoricalField::Ethnicity), "Nordic");
        }
    }

    #[test]
    fn test_blank_category_on_positive_row_becomes_unknown() {
        let source: Vec<AnnotatedRecord> = source_rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let mut record = row.into_record();
                if i == 0 {
                    record.set_category(CategoricalField::Sex, "");
                }
                AnnotatedRecord::new(record, true)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(8);
        let rows = RecordSynthesizer::default().generate(&source, 400, &mut rng).unwrap();
        for row in &rows {
            let sex = row.record().category(CategoricalField::Sex);
            assert!(["F", "M", UNKNOWN_CATEGORY].contains(&sex), "unexpected sex {sex:?}");
        }
    }
}
