//! Distributional fidelity between an original and a synthetic dataset
//!
//! Each numeric feature is binned over the union range of both datasets so
//! bins align positionally. The aligned percentage sequences are smoothed
//! with a centered moving average and compared by histogram intersection.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::models::{NumericField, PanelRecord};

/// Closed value interval used for binning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower edge of the first bin
    pub min: f64,
    /// Upper edge of the last bin
    pub max: f64,
}

impl ValueRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Smallest range covering all values, `None` for no values
    #[must_use]
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut iter = values.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    /// Smallest range covering both ranges
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Width of the range
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// One histogram bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    /// Position of the bin
    pub index: usize,
    /// Value at the middle of the bin
    pub center: f64,
    /// Share of values falling in the bin, 0 to 100
    pub percent: f64,
}

/// Histogram settings for quality scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    /// Number of bins per feature
    pub bin_count: usize,
    /// Moving-average window applied before comparison; 0 or 1 disables smoothing
    pub smoothing_window: usize,
    /// Features compared
    pub features: Vec<NumericField>,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            bin_count: 20,
            smoothing_window: 5,
            features: NumericField::ALL.to_vec(),
        }
    }
}

/// Aligned histograms of one feature in both datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureComparison {
    /// Feature compared
    pub field: NumericField,
    /// Shared binning range
    pub range: ValueRange,
    /// Histogram of the original dataset
    pub original: Vec<HistogramBin>,
    /// Histogram of the synthetic dataset
    pub synthetic: Vec<HistogramBin>,
    /// Intersection of the smoothed histograms, 0 to 100
    pub overlap: u32,
}

/// Finite values of a field across records
#[must_use]
pub fn field_values<R: AsRef<PanelRecord>>(records: &[R], field: NumericField) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.as_ref().value(field))
        .collect()
}

/// Histogram of one field
///
/// Without an explicit range the values' own min and max are used. Values
/// outside the range land in the first or last bin. A degenerate range puts
/// every value in the first bin.
#[must_use]
pub fn histogram<R: AsRef<PanelRecord>>(
    records: &[R],
    field: NumericField,
    bin_count: usize,
    range: Option<ValueRange>,
) -> Vec<HistogramBin> {
    histogram_of(&field_values(records, field), bin_count, range)
}

/// Histogram of raw values; see [`histogram`]
#[must_use]
pub fn histogram_of(values: &[f64], bin_count: usize, range: Option<ValueRange>) -> Vec<HistogramBin> {
    if bin_count == 0 {
        return Vec::new();
    }
    let Some(range) = range.or_else(|| ValueRange::of(values)) else {
        return Vec::new();
    };

    let width = range.width() / bin_count as f64;
    let degenerate = !(width.is_finite() && width > 0.0);
    let mut counts = vec![0usize; bin_count];
    let mut total = 0usize;

    for &value in values.iter().filter(|v| v.is_finite()) {
        let index = if degenerate {
            0
        } else {
            let raw = ((value - range.min) / width).floor();
            if raw <= 0.0 { 0 } else { (raw as usize).min(bin_count - 1) }
        };
        counts[index] += 1;
        total += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            index,
            center: if degenerate {
                range.min
            } else {
                range.min + width * (index as f64 + 0.5)
            },
            percent: if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            },
        })
        .collect()
}

/// Centered moving average, truncated at the edges
#[must_use]
pub fn smooth(series: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return series.to_vec();
    }
    let half = window / 2;
    (0..series.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(series.len());
            let slice = &series[lo..hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Scale a non-negative series so it sums to 100
///
/// Edge truncation in [`smooth`] does not preserve the total.
#[must_use]
pub fn rescale(series: &[f64]) -> Vec<f64> {
    let total: f64 = series.iter().sum();
    if total > 0.0 {
        series.iter().map(|v| v * 100.0 / total).collect()
    } else {
        series.to_vec()
    }
}

/// Histogram intersection of two aligned percentage sequences, rounded to 0..=100
#[must_use]
pub fn overlap(a: &[f64], b: &[f64]) -> u32 {
    let shared: f64 = a.iter().zip(b).map(|(x, y)| x.min(*y)).sum();
    shared.round().clamp(0.0, 100.0) as u32
}

/// Histogram intersection of two aligned histograms
#[must_use]
pub fn overlap_bins(a: &[HistogramBin], b: &[HistogramBin]) -> u32 {
    overlap(&percents(a), &percents(b))
}

fn percents(bins: &[HistogramBin]) -> Vec<f64> {
    bins.iter().map(|bin| bin.percent).collect()
}

/// Scores how closely synthetic feature distributions follow the original
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    settings: QualitySettings,
}

impl QualityScorer {
    /// Create a scorer
    #[must_use]
    pub const fn new(settings: QualitySettings) -> Self {
        Self { settings }
    }

    /// The settings in use
    #[must_use]
    pub const fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    /// Compare one feature
    ///
    /// # Errors
    /// [`SynthError::NotComputable`] when either dataset has no value for the feature.
    pub fn compare_field<A, B>(&self, original: &[A], synthetic: &[B], field: NumericField) -> Result<FeatureComparison>
    where
        A: AsRef<PanelRecord>,
        B: AsRef<PanelRecord>,
    {
        let original_values = field_values(original, field);
        let synthetic_values = field_values(synthetic, field);
        let (Some(a), Some(b)) = (ValueRange::of(&original_values), ValueRange::of(&synthetic_values)) else {
            return Err(SynthError::NotComputable(format!(
                "no {field} values in one of the datasets"
            )));
        };
        let range = a.union(b);

        let bins = self.settings.bin_count;
        let original = histogram_of(&original_values, bins, Some(range));
        let synthetic = histogram_of(&synthetic_values, bins, Some(range));

        let window = self.settings.smoothing_window;
        let overlap = overlap(
            &rescale(&smooth(&percents(&original), window)),
            &rescale(&smooth(&percents(&synthetic), window)),
        );

        Ok(FeatureComparison {
            field,
            range,
            original,
            synthetic,
            overlap,
        })
    }

    /// Compare every configured feature, skipping those that are not computable
    pub fn compare<A, B>(&self, original: &[A], synthetic: &[B]) -> Vec<FeatureComparison>
    where
        A: AsRef<PanelRecord>,
        B: AsRef<PanelRecord>,
    {
        self.settings
            .features
            .iter()
            .filter_map(|&field| match self.compare_field(original, synthetic, field) {
                Ok(comparison) => Some(comparison),
                Err(e) => {
                    log::debug!("Skipping {field} in quality scoring: {e}");
                    None
                }
            })
            .collect()
    }

    /// Mean overlap across configured features, rounded
    ///
    /// # Errors
    /// [`SynthError::NotComputable`] when no feature can be compared.
    pub fn similarity<A, B>(&self, original: &[A], synthetic: &[B]) -> Result<u32>
    where
        A: AsRef<PanelRecord>,
        B: AsRef<PanelRecord>,
    {
        similarity_of(&self.compare(original, synthetic))
    }
}

/// Rounded mean overlap of a set of comparisons
pub fn similarity_of(comparisons: &[FeatureComparison]) -> Result<u32> {
    if comparisons.is_empty() {
        return Err(SynthError::NotComputable(
            "no feature is present in both datasets".to_string(),
        ));
    }
    let sum: u32 = comparisons.iter().map(|c| c.overlap).sum();
    Ok((f64::from(sum) / comparisons.len() as f64).round() as u32)
}
