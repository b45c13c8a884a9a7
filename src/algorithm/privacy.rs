//! Re-identification and attribute-disclosure risk
//!
//! Re-identification risk is the share of synthetic rows whose nearest
//! original row, in z-scored quasi-identifier space, lies closer than a
//! threshold derived from the original rows' own nearest-neighbour spacing.
//! Attribute-disclosure risk is the share of synthetic rows reproducing a
//! categorical combination that is rare in the original data.

use itertools::Itertools;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Instant;

use crate::error::{Result, SynthError};
use crate::models::{NumericField, PanelRecord};
use crate::utils::logging::{log_operation_complete, log_operation_start};
use crate::utils::stats;

/// Z-scored quasi-identifier vector of one row
pub type FeatureVector = SmallVec<[f64; 8]>;

/// Settings for privacy scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    /// Numeric fields treated as quasi-identifiers
    pub quasi_identifiers: Vec<NumericField>,
    /// Multiplier applied to the median internal nearest-neighbour distance
    pub threshold_factor: f64,
    /// Smallest threshold allowed
    pub min_threshold: f64,
    /// Combinations strictly below this share of original rows are rare
    pub rare_fraction: f64,
    /// Maximum number of rare combinations reported
    pub rare_limit: usize,
    /// Separator joining categorical values into a combination key
    pub combination_separator: String,
    /// Distance computations above which the search runs on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            quasi_identifiers: NumericField::ALL.to_vec(),
            threshold_factor: 0.6,
            min_threshold: 1e-6,
            rare_fraction: 0.05,
            rare_limit: 12,
            combination_separator: " | ".to_string(),
            parallel_threshold: 50_000,
        }
    }
}

/// Outcome of a re-identification assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyAssessment {
    /// Share of synthetic rows closer than the threshold to an original row, 0 to 100
    pub risk_percent: u32,
    /// Distance below which a synthetic row counts as too close
    pub threshold: f64,
    /// Number of synthetic rows below the threshold
    pub flagged_count: usize,
    /// Identifiers of the flagged synthetic rows
    pub flagged_ids: Vec<String>,
}

/// A categorical combination and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RareCombination {
    /// Categorical values joined with the configured separator
    pub label: String,
    /// Number of original rows with this combination
    pub count: usize,
}

/// Mean and spread of each quasi-identifier in the original data
#[derive(Debug, Clone, PartialEq)]
struct Standardizer {
    fields: Vec<NumericField>,
    means: FeatureVector,
    std_devs: FeatureVector,
}

impl Standardizer {
    fn fit<R: AsRef<PanelRecord>>(original: &[R], fields: Vec<NumericField>) -> Self {
        let mut means = FeatureVector::new();
        let mut std_devs = FeatureVector::new();
        for &field in &fields {
            let values: Vec<f64> = original.iter().filter_map(|r| r.as_ref().value(field)).collect();
            let mean = stats::mean(&values).unwrap_or(0.0);
            let std_dev = stats::population_std_dev(&values, mean);
            means.push(mean);
            std_devs.push(if std_dev > 0.0 { std_dev } else { 1.0 });
        }
        Self {
            fields,
            means,
            std_devs,
        }
    }

    fn vectorize(&self, record: &PanelRecord) -> FeatureVector {
        self.fields
            .iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(&field, (mean, std_dev))| {
                record.value(field).map_or(0.0, |v| (v - mean) / std_dev)
            })
            .collect()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Distance from `point` to its nearest neighbour in `candidates`
///
/// `skip` excludes one candidate by index. Infinite when there is no candidate.
fn nearest_distance(point: &[f64], candidates: &[FeatureVector], skip: Option<usize>) -> f64 {
    candidates
        .iter()
        .enumerate()
        .filter(|(j, _)| Some(*j) != skip)
        .map(|(_, candidate)| euclidean(point, candidate))
        .fold(f64::INFINITY, f64::min)
}

/// Scores disclosure risk of a synthetic dataset against its source
#[derive(Debug, Clone, Default)]
pub struct PrivacyScorer {
    settings: PrivacySettings,
}

impl PrivacyScorer {
    /// Create a scorer
    #[must_use]
    pub const fn new(settings: PrivacySettings) -> Self {
        Self { settings }
    }

    /// The settings in use
    #[must_use]
    pub const fn settings(&self) -> &PrivacySettings {
        &self.settings
    }

    /// Nearest-neighbour re-identification risk
    ///
    /// # Arguments
    /// * `original` - Source rows; define the standardization and the threshold
    /// * `synthetic` - Generated rows being assessed
    ///
    /// # Returns
    /// Risk percentage, the derived threshold and the synthetic rows under it
    ///
    /// # Errors
    /// [`SynthError::NotComputable`] when either dataset is empty or no
    /// quasi-identifier has a value in either dataset.
    pub fn assess<A, B>(&self, original: &[A], synthetic: &[B]) -> Result<PrivacyAssessment>
    where
        A: AsRef<PanelRecord>,
        B: AsRef<PanelRecord>,
    {
        if original.is_empty() || synthetic.is_empty() {
            return Err(SynthError::NotComputable(
                "re-identification risk needs rows on both sides".to_string(),
            ));
        }

        let fields: Vec<NumericField> = self
            .settings
            .quasi_identifiers
            .iter()
            .copied()
            .unique()
            .filter(|&field| {
                original.iter().any(|r| r.as_ref().value(field).is_some())
                    || synthetic.iter().any(|r| r.as_ref().value(field).is_some())
            })
            .collect();
        if fields.is_empty() {
            return Err(SynthError::NotComputable(
                "no quasi-identifier values in either dataset".to_string(),
            ));
        }

        let start = Instant::now();
        log_operation_start(
            "Assessing re-identification risk for",
            format!("{} synthetic rows against {} originals", synthetic.len(), original.len()),
        );

        let standardizer = Standardizer::fit(original, fields);
        let original_vectors: Vec<FeatureVector> =
            original.iter().map(|r| standardizer.vectorize(r.as_ref())).collect();
        let synthetic_vectors: Vec<FeatureVector> =
            synthetic.iter().map(|r| standardizer.vectorize(r.as_ref())).collect();

        let parallel = original.len().saturating_mul(original.len().max(synthetic.len()))
            >= self.settings.parallel_threshold;

        let internal: Vec<f64> = if parallel {
            original_vectors
                .par_iter()
                .enumerate()
                .map(|(i, v)| nearest_distance(v, &original_vectors, Some(i)))
                .collect()
        } else {
            original_vectors
                .iter()
                .enumerate()
                .map(|(i, v)| nearest_distance(v, &original_vectors, Some(i)))
                .collect()
        };
        let internal: Vec<f64> = internal.into_iter().filter(|d| d.is_finite()).collect();
        let threshold = stats::median(&internal)
            .map_or(0.0, |median| median * self.settings.threshold_factor)
            .max(self.settings.min_threshold);

        let nearest: Vec<f64> = if parallel {
            synthetic_vectors
                .par_iter()
                .map(|v| nearest_distance(v, &original_vectors, None))
                .collect()
        } else {
            synthetic_vectors
                .iter()
                .map(|v| nearest_distance(v, &original_vectors, None))
                .collect()
        };

        let flagged_ids: Vec<String> = nearest
            .iter()
            .zip(synthetic)
            .filter(|(d, _)| **d < threshold)
            .map(|(_, r)| r.as_ref().id().to_string())
            .collect();
        let flagged_count = flagged_ids.len();
        let risk_percent = percent(flagged_count, synthetic.len());

        log::debug!("Re-identification threshold {threshold:.4}, {flagged_count} rows flagged");
        log_operation_complete("scored", "re-identification risk", synthetic.len(), Some(start.elapsed()));

        Ok(PrivacyAssessment {
            risk_percent,
            threshold,
            flagged_count,
            flagged_ids,
        })
    }

    /// Occurrences of each categorical combination
    #[must_use]
    pub fn combination_counts<R: AsRef<PanelRecord>>(&self, records: &[R]) -> FxHashMap<String, usize> {
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for record in records {
            let key = record.as_ref().combination_key(&self.settings.combination_separator);
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    /// Every combination occurring in strictly less than the rare fraction of rows
    ///
    /// Sorted by ascending count, then label.
    #[must_use]
    pub fn rare_combinations<R: AsRef<PanelRecord>>(&self, original: &[R]) -> Vec<RareCombination> {
        let total = original.len();
        self.combination_counts(original)
            .into_iter()
            .filter(|&(_, count)| (count as f64 / total as f64) < self.settings.rare_fraction)
            .map(|(label, count)| RareCombination { label, count })
            .sorted_by(|a, b| a.count.cmp(&b.count).then_with(|| a.label.cmp(&b.label)))
            .collect()
    }

    /// The rarest combinations, capped at the configured limit
    #[must_use]
    pub fn reported_rare_combinations<R: AsRef<PanelRecord>>(&self, original: &[R]) -> Vec<RareCombination> {
        let mut rare = self.rare_combinations(original);
        rare.truncate(self.settings.rare_limit);
        rare
    }

    /// Share of synthetic rows reproducing a rare original combination, 0 to 100
    ///
    /// # Errors
    /// [`SynthError::NotComputable`] when either dataset is empty.
    pub fn attribute_risk<A, B>(&self, original: &[A], synthetic: &[B]) -> Result<u32>
    where
        A: AsRef<PanelRecord>,
        B: AsRef<PanelRecord>,
    {
        if original.is_empty() || synthetic.is_empty() {
            return Err(SynthError::NotComputable(
                "attribute-disclosure risk needs rows on both sides".to_string(),
            ));
        }

        let rare: FxHashSet<String> = self
            .rare_combinations(original)
            .into_iter()
            .map(|combination| combination.label)
            .collect();
        let separator = &self.settings.combination_separator;
        let leaked = synthetic
            .iter()
            .filter(|r| rare.contains(&r.as_ref().combination_key(separator)))
            .count();
        Ok(percent(leaked, synthetic.len()))
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round().clamp(0.0, 100.0) as u32
}
