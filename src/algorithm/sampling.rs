//! Weighted empirical distributions over categorical fields

use rand::Rng;
use rustc_hash::FxHashMap;

use crate::error::{Result, SynthError};
use crate::models::{CategoricalField, PanelRecord, UNKNOWN_CATEGORY};

/// Observed values of one categorical field with their weights
///
/// Values keep the order in which they were first seen, which is also the
/// order the cumulative draw walks.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalDistribution {
    name: String,
    entries: Vec<(String, f64)>,
    index: FxHashMap<String, usize>,
    cumulative: Vec<f64>,
}

impl CategoricalDistribution {
    /// Count occurrences of every value of `field`
    ///
    /// Blank values count as `Unknown`. An empty record set yields a
    /// distribution holding only `Unknown` with weight 1.
    #[must_use]
    pub fn from_records<R: AsRef<PanelRecord>>(records: &[R], field: CategoricalField) -> Self {
        let mut counts: Vec<(String, f64)> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for record in records {
            let value = normalize_category(record.as_ref().category(field));
            match index.get(value) {
                Some(&i) => counts[i].1 += 1.0,
                None => {
                    index.insert(value.to_string(), counts.len());
                    counts.push((value.to_string(), 1.0));
                }
            }
        }

        if counts.is_empty() {
            index.insert(UNKNOWN_CATEGORY.to_string(), 0);
            counts.push((UNKNOWN_CATEGORY.to_string(), 1.0));
        }

        Self::assemble(field.to_string(), counts, index)
    }

    /// Build a distribution from explicit weights
    ///
    /// Repeated values have their weights summed; non-positive or non-finite
    /// weights are skipped.
    pub fn from_weights<I, S>(name: impl Into<String>, weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut entries: Vec<(String, f64)> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for (value, weight) in weights {
            let value = value.into();
            if !weight.is_finite() || weight <= 0.0 {
                log::warn!("Skipping weight {weight} for '{value}' in distribution '{name}'");
                continue;
            }
            match index.get(&value) {
                Some(&i) => entries[i].1 += weight,
                None => {
                    index.insert(value.clone(), entries.len());
                    entries.push((value, weight));
                }
            }
        }

        if entries.is_empty() {
            return Err(SynthError::EmptyDistribution(name));
        }
        Ok(Self::assemble(name, entries, index))
    }

    fn assemble(name: String, entries: Vec<(String, f64)>, index: FxHashMap<String, usize>) -> Self {
        let cumulative = entries
            .iter()
            .scan(0.0, |running, (_, weight)| {
                *running += weight;
                Some(*running)
            })
            .collect();
        Self {
            name,
            entries,
            index,
            cumulative,
        }
    }

    /// Field or distribution name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in first-seen order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(value, _)| value.as_str())
    }

    /// Weight of a value, if it was observed
    #[must_use]
    pub fn weight(&self, value: &str) -> Option<f64> {
        self.index.get(value).map(|&i| self.entries[i].1)
    }

    /// Sum of all weights
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Whether a value is part of the distribution
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    /// Number of distinct values
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the distribution has no values
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draw one value by weight
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let i = draw(&self.cumulative, rng);
        &self.entries[i].0
    }

    /// Draw one value with one value's weight multiplied by `factor`
    ///
    /// A bias value missing from the distribution takes part in the draw with
    /// `factor` as its weight. A non-positive or non-finite factor disables the
    /// bias. The bias value is trimmed, and a blank one stands for `Unknown`.
    pub fn sample_biased<R: Rng + ?Sized>(&self, bias_value: &str, factor: f64, rng: &mut R) -> String {
        if !factor.is_finite() || factor <= 0.0 {
            return self.sample(rng).to_string();
        }
        let bias_value = normalize_category(bias_value);

        let biased = self.index.get(bias_value).copied();
        let mut cumulative = Vec::with_capacity(self.entries.len() + 1);
        let mut running = 0.0;
        for (i, (_, weight)) in self.entries.iter().enumerate() {
            running += if Some(i) == biased { weight * factor } else { *weight };
            cumulative.push(running);
        }
        if biased.is_none() {
            cumulative.push(running + factor);
        }

        let i = draw(&cumulative, rng);
        match self.entries.get(i) {
            Some((value, _)) => value.clone(),
            None => bias_value.to_string(),
        }
    }
}

/// Trimmed categorical value, `Unknown` when blank
fn normalize_category(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() { UNKNOWN_CATEGORY } else { trimmed }
}

/// Index of the entry a uniform draw in `[0, total)` lands on
///
/// Falls back to the last entry when rounding carries the draw past the final
/// cumulative weight.
fn draw<R: Rng + ?Sized>(cumulative: &[f64], rng: &mut R) -> usize {
    let last = cumulative.len().saturating_sub(1);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total <= 0.0 {
        return last;
    }
    let target = rng.random_range(0.0..total);
    cumulative.partition_point(|&c| c < target).min(last)
}
