//! Calibrated noise for numeric fields
//!
//! Each numeric field has a general noise profile spanning its plausible
//! clinical range and, optionally, a narrower signature profile used for
//! rows that matched the clinical signature. Perturbed values are clipped
//! into the selected profile and rounded to the field's precision, so a
//! configured field never leaves its bounds.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SynthError};
use crate::models::{Measurement, NumericField};

/// Bounds and relative noise magnitude for one regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseRange {
    /// Smallest value a perturbed value may take
    pub lower_bound: f64,
    /// Largest value a perturbed value may take
    pub upper_bound: f64,
    /// Perturbation half-width relative to `max(1, |value|)`
    pub noise_fraction: f64,
}

impl NoiseRange {
    /// Create a range
    #[must_use]
    pub const fn new(lower_bound: f64, upper_bound: f64, noise_fraction: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            noise_fraction,
        }
    }

    /// Clip a value into the range
    #[must_use]
    pub fn clip(&self, value: f64) -> f64 {
        value.max(self.lower_bound).min(self.upper_bound)
    }

    /// Whether a value lies within the inclusive bounds
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }

    fn validate(&self, field: NumericField, regime: &str) -> Result<()> {
        if !self.lower_bound.is_finite() || !self.upper_bound.is_finite() {
            return Err(SynthError::Config(format!(
                "{field} {regime} noise bounds must be finite"
            )));
        }
        if self.lower_bound > self.upper_bound {
            return Err(SynthError::Config(format!(
                "{field} {regime} noise lower bound {} exceeds upper bound {}",
                self.lower_bound, self.upper_bound
            )));
        }
        if !self.noise_fraction.is_finite() || self.noise_fraction < 0.0 {
            return Err(SynthError::Config(format!(
                "{field} {regime} noise fraction must be a non-negative number"
            )));
        }
        Ok(())
    }
}

/// General and signature-preserving noise ranges for one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldNoiseProfile {
    /// Range used for ordinary rows
    pub general: NoiseRange,
    /// Narrower range used for signature-positive rows, if any
    #[serde(default)]
    pub signature: Option<NoiseRange>,
}

impl FieldNoiseProfile {
    /// Profile with both regimes
    #[must_use]
    pub const fn new(general: NoiseRange, signature: Option<NoiseRange>) -> Self {
        Self { general, signature }
    }

    /// Range for a row; falls back to the general range when no signature range exists
    #[must_use]
    pub fn select(&self, preserve_signature: bool) -> &NoiseRange {
        match (&self.signature, preserve_signature) {
            (Some(signature), true) => signature,
            _ => &self.general,
        }
    }
}

/// Noise configuration for every numeric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Per-field profiles; fields without one get unclipped fallback noise
    pub profiles: BTreeMap<NumericField, FieldNoiseProfile>,
    /// Values below this get an extra fixed-magnitude jitter
    pub small_value_cutoff: f64,
    /// Half-width of the small-value jitter
    pub small_value_jitter: f64,
    /// Relative noise for fields with no profile
    pub fallback_fraction: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        let profiles = BTreeMap::from([
            (
                NumericField::Hb,
                FieldNoiseProfile::new(
                    NoiseRange::new(5.0, 18.0, 0.05),
                    Some(NoiseRange::new(8.0, 12.0, 0.03)),
                ),
            ),
            (
                NumericField::Mcv,
                FieldNoiseProfile::new(
                    NoiseRange::new(50.0, 110.0, 0.04),
                    Some(NoiseRange::new(55.0, 80.0, 0.03)),
                ),
            ),
            (
                NumericField::Mch,
                FieldNoiseProfile::new(
                    NoiseRange::new(15.0, 35.0, 0.04),
                    Some(NoiseRange::new(17.0, 27.0, 0.03)),
                ),
            ),
            (
                NumericField::HbA2,
                FieldNoiseProfile::new(
                    NoiseRange::new(1.5, 7.0, 0.06),
                    Some(NoiseRange::new(3.6, 6.5, 0.04)),
                ),
            ),
            (
                NumericField::Ferritin,
                FieldNoiseProfile::new(NoiseRange::new(5.0, 400.0, 0.08), None),
            ),
        ]);

        Self {
            profiles,
            small_value_cutoff: 10.0,
            small_value_jitter: 0.05,
            fallback_fraction: 0.02,
        }
    }
}

impl NoiseSettings {
    /// Replace the profile of one field
    #[must_use]
    pub fn with_profile(mut self, field: NumericField, profile: FieldNoiseProfile) -> Self {
        self.profiles.insert(field, profile);
        self
    }

    /// Remove the profile of one field so it uses fallback noise
    #[must_use]
    pub fn without_profile(mut self, field: NumericField) -> Self {
        self.profiles.remove(&field);
        self
    }

    /// Override the noise fraction of every regime, jitter and fallback included
    ///
    /// A fraction of zero yields a synthesizer that only clips and rounds.
    #[must_use]
    pub fn with_noise_fraction(mut self, fraction: f64) -> Self {
        for profile in self.profiles.values_mut() {
            profile.general.noise_fraction = fraction;
            if let Some(signature) = profile.signature.as_mut() {
                signature.noise_fraction = fraction;
            }
        }
        self.fallback_fraction = fraction;
        if fraction == 0.0 {
            self.small_value_jitter = 0.0;
        }
        self
    }

    /// Check that every range is usable
    pub fn validate(&self) -> Result<()> {
        for (field, profile) in &self.profiles {
            profile.general.validate(*field, "general")?;
            if let Some(signature) = &profile.signature {
                signature.validate(*field, "signature")?;
            }
        }
        for (name, value) in [
            ("small value jitter", self.small_value_jitter),
            ("fallback fraction", self.fallback_fraction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SynthError::Config(format!("{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}

/// Perturbs numeric values according to [`NoiseSettings`]
#[derive(Debug, Clone, Default)]
pub struct NoiseCalibrator {
    settings: NoiseSettings,
}

impl NoiseCalibrator {
    /// Create a calibrator
    #[must_use]
    pub const fn new(settings: NoiseSettings) -> Self {
        Self { settings }
    }

    /// The settings in use
    #[must_use]
    pub const fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Perturb a measurement
    ///
    /// Absent, non-numeric and non-finite measurements are returned unchanged.
    pub fn perturb<R: Rng + ?Sized>(
        &self,
        field: NumericField,
        value: &Measurement,
        preserve_signature: bool,
        rng: &mut R,
    ) -> Measurement {
        match value.as_f64() {
            Some(v) => Measurement::Value(self.perturb_value(field, v, preserve_signature, rng)),
            None => value.clone(),
        }
    }

    /// Perturb a raw number
    ///
    /// # Arguments
    /// * `field` - Field the value belongs to; selects profile and precision
    /// * `value` - Unperturbed value
    /// * `preserve_signature` - Use the signature profile when the field has one
    /// * `rng` - Random source
    ///
    /// # Returns
    /// The perturbed value, within the selected profile's bounds when the field
    /// has a profile. Non-finite input is returned unchanged.
    pub fn perturb_value<R: Rng + ?Sized>(
        &self,
        field: NumericField,
        value: f64,
        preserve_signature: bool,
        rng: &mut R,
    ) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let precision = field.precision();

        let Some(profile) = self.settings.profiles.get(&field) else {
            let spread = self.settings.fallback_fraction * value.abs();
            let perturbed = value + symmetric(rng, spread);
            if !perturbed.is_finite() {
                return value;
            }
            return round_to(perturbed, precision);
        };

        let range = profile.select(preserve_signature);
        let spread = range.noise_fraction * value.abs().max(1.0);
        let mut perturbed = value + symmetric(rng, spread);
        if value < self.settings.small_value_cutoff {
            perturbed += symmetric(rng, self.settings.small_value_jitter);
        }

        // Rounding can step past a bound that is not representable at this precision
        range.clip(round_to(range.clip(perturbed), precision))
    }
}

/// Uniform draw in `[-spread, spread]`, zero for a non-positive spread
fn symmetric<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    if spread > 0.0 {
        rng.random_range(-spread..=spread)
    } else {
        0.0
    }
}

/// Round to a number of decimal places
///
/// Values too large to scale are already coarser than the requested
/// precision and are returned unchanged.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}
