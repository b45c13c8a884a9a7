//! Configuration for labsynth.
//!
//! Every section has defaults matching the screening panel, so a JSON file
//! only needs the values that differ. A few settings can also be overridden
//! from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algorithm::noise::NoiseSettings;
use crate::algorithm::privacy::PrivacySettings;
use crate::algorithm::quality::QualitySettings;
use crate::algorithm::signature::SignatureRules;
use crate::algorithm::synthesis::{BackendSettings, SynthesisSettings};
use crate::error::{Result, SynthError};

/// Environment variable overriding the random seed
pub const ENV_SEED: &str = "LABSYNTH_SEED";
/// Environment variable setting the remote generation URL
pub const ENV_REMOTE_URL: &str = "LABSYNTH_REMOTE_URL";
/// Environment variable overriding the worker thread count
pub const ENV_THREADS: &str = "LABSYNTH_THREADS";

/// Configuration for generation and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Seed for the random source; fresh entropy per request when unset
    pub seed: Option<u64>,
    /// Worker threads for parallel scoring
    pub threads: usize,
    /// Clinical signature rules
    pub signature: SignatureRules,
    /// Numeric noise profiles
    pub noise: NoiseSettings,
    /// Row synthesis
    pub synthesis: SynthesisSettings,
    /// Distribution similarity
    pub quality: QualitySettings,
    /// Disclosure risk
    pub privacy: PrivacySettings,
    /// Generation backend selection
    pub backend: BackendSettings,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: None,
            threads: num_cpus::get(),
            signature: SignatureRules::default(),
            noise: NoiseSettings::default(),
            synthesis: SynthesisSettings::default(),
            quality: QualitySettings::default(),
            privacy: PrivacySettings::default(),
            backend: BackendSettings::default(),
        }
    }
}

impl SynthConfig {
    /// Load configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup(ENV_SEED) {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| SynthError::Config(format!("{ENV_SEED}='{seed}': {e}")))?;
            self.seed = Some(seed);
        }
        if let Some(url) = lookup(ENV_REMOTE_URL) {
            let url = url.trim();
            self.backend.remote_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(threads) = lookup(ENV_THREADS) {
            let threads = threads
                .trim()
                .parse::<usize>()
                .map_err(|e| SynthError::Config(format!("{ENV_THREADS}='{threads}': {e}")))?;
            self.threads = threads;
        }
        self.validate()?;
        Ok(self)
    }

    /// Set the random seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the worker thread count
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Replace the noise settings
    #[must_use]
    pub fn with_noise(mut self, noise: NoiseSettings) -> Self {
        self.noise = noise;
        self
    }

    /// Replace the signature rules
    #[must_use]
    pub fn with_signature(mut self, signature: SignatureRules) -> Self {
        self.signature = signature;
        self
    }

    /// Use a remote generation service with local fallback
    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.backend.remote_url = Some(url.into());
        self
    }

    /// Show progress bars during generation
    #[must_use]
    pub const fn with_progress(mut self, show: bool) -> Self {
        self.synthesis.show_progress = show;
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(SynthError::Config("threads must be at least 1".to_string()));
        }
        self.noise.validate()?;
        if self.quality.bin_count == 0 {
            return Err(SynthError::Config("bin count must be at least 1".to_string()));
        }
        let bias = self.synthesis.bias_factor;
        if !bias.is_finite() || bias <= 0.0 {
            return Err(SynthError::Config(format!("bias factor {bias} must be positive")));
        }
        let privacy = &self.privacy;
        if !(privacy.rare_fraction > 0.0 && privacy.rare_fraction <= 1.0) {
            return Err(SynthError::Config(format!(
                "rare fraction {} must be in (0, 1]",
                privacy.rare_fraction
            )));
        }
        if !privacy.threshold_factor.is_finite() || privacy.threshold_factor < 0.0 {
            return Err(SynthError::Config("threshold factor must be non-negative".to_string()));
        }
        if !privacy.min_threshold.is_finite() || privacy.min_threshold <= 0.0 {
            return Err(SynthError::Config("minimum threshold must be positive".to_string()));
        }
        Ok(())
    }
}
