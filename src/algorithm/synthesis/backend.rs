//! Generation backends
//!
//! A generation request can be served in-process or by a remote generation
//! service. Both sit behind [`GenerationBackend`]; [`FallbackBackend`] tries a
//! primary backend and answers from a secondary one when the primary fails.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{RecordSynthesizer, requested_count};
use crate::algorithm::noise::NoiseCalibrator;
use crate::algorithm::signature::SignatureClassifier;
use crate::config::SynthConfig;
use crate::error::{Result, SynthError};
use crate::models::{AnnotatedRecord, PanelRecord};

/// Request to generate synthetic rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Cleaned source rows
    pub original_rows: Vec<PanelRecord>,
    /// Number of rows to produce; must be positive
    pub rows_to_generate: i64,
}

impl GenerationRequest {
    /// Create a request
    #[must_use]
    pub const fn new(original_rows: Vec<PanelRecord>, rows_to_generate: i64) -> Self {
        Self {
            original_rows,
            rows_to_generate,
        }
    }
}

/// Synthetic rows produced for a [`GenerationRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Exactly `rows_to_generate` rows
    pub synthetic_rows: Vec<AnnotatedRecord>,
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of a remote generation service; local generation only when unset
    pub remote_url: Option<String>,
    /// Request timeout for the remote service in seconds
    pub timeout_seconds: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            remote_url: None,
            timeout_seconds: 30,
        }
    }
}

/// Something that can answer a generation request
pub trait GenerationBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Generate synthetic rows for a request
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>>;
}

/// In-process generation: classify the source rows, then synthesize
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    classifier: SignatureClassifier,
    synthesizer: RecordSynthesizer,
    seed: Option<u64>,
}

impl LocalBackend {
    /// Create a local backend; without a seed every request draws fresh entropy
    #[must_use]
    pub const fn new(classifier: SignatureClassifier, synthesizer: RecordSynthesizer, seed: Option<u64>) -> Self {
        Self {
            classifier,
            synthesizer,
            seed,
        }
    }

    /// Build from configuration
    #[must_use]
    pub fn from_config(config: &SynthConfig) -> Self {
        Self::new(
            SignatureClassifier::new(config.signature.clone()),
            RecordSynthesizer::new(
                NoiseCalibrator::new(config.noise.clone()),
                config.synthesis.clone(),
            ),
            config.seed,
        )
    }

    /// Serve a request on the current thread
    pub fn generate_now(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let count = requested_count(request.rows_to_generate)?;
        if request.original_rows.is_empty() {
            return Err(SynthError::EmptyDataset);
        }

        let annotated = self.classifier.annotate(&request.original_rows);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let synthetic_rows = self.synthesizer.generate(&annotated, count, &mut rng)?;
        Ok(GenerationResponse { synthetic_rows })
    }
}

impl GenerationBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
        Box::pin(async move { self.generate_now(request) })
    }
}

/// Client for a remote generation service
///
/// The service accepts a JSON [`GenerationRequest`] at `POST {base}/generate`
/// and answers with a [`GenerationResponse`].
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    base_url: String,
    http_client: reqwest::Client,
}

impl RemoteBackend {
    /// Create a client with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Base URL of the service
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the service answers its health endpoint successfully
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    async fn post_generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        requested_count(request.rows_to_generate)?;

        let url = format!("{}/generate", self.base_url);
        log::debug!("Posting {} rows to {url}", request.original_rows.len());
        let response = self.http_client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthError::Remote(format!(
                "generation failed ({status}): {error_text}"
            )));
        }

        let body: GenerationResponse = response.json().await?;
        let expected = request.rows_to_generate;
        if i64::try_from(body.synthetic_rows.len()).ok() != Some(expected) {
            return Err(SynthError::Remote(format!(
                "expected {expected} rows, service returned {}",
                body.synthetic_rows.len()
            )));
        }
        Ok(body)
    }
}

impl GenerationBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
        Box::pin(self.post_generate(request))
    }
}

/// Tries a primary backend and falls back to a secondary one on failure
///
/// Caller errors (empty dataset, invalid count) are returned as-is since
/// every backend rejects them alike.
pub struct FallbackBackend {
    primary: Box<dyn GenerationBackend>,
    fallback: Box<dyn GenerationBackend>,
}

impl FallbackBackend {
    /// Combine two backends
    #[must_use]
    pub fn new(primary: Box<dyn GenerationBackend>, fallback: Box<dyn GenerationBackend>) -> Self {
        Self { primary, fallback }
    }
}

impl GenerationBackend for FallbackBackend {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
        Box::pin(async move {
            let message = match self.primary.generate(request).await {
                Ok(response) => return Ok(response),
                Err(e @ (SynthError::EmptyDataset | SynthError::InvalidCount(_))) => return Err(e),
                Err(e) => e.to_string(),
            };
            log::warn!(
                "{} backend failed ({message}); falling back to {} backend",
                self.primary.name(),
                self.fallback.name()
            );
            self.fallback.generate(request).await
        })
    }
}

/// Backend selected by configuration
///
/// Local generation unless a remote URL is configured, in which case the
/// remote service is tried first with local generation as fallback.
pub fn backend_from_config(config: &SynthConfig) -> Result<Box<dyn GenerationBackend>> {
    let local = Box::new(LocalBackend::from_config(config));
    match config.backend.remote_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            let remote = RemoteBackend::new(url, Duration::from_secs(config.backend.timeout_seconds))?;
            log::info!("Using remote generation at {} with local fallback", remote.base_url());
            Ok(Box::new(FallbackBackend::new(Box::new(remote), local)))
        }
        _ => Ok(local),
    }
}

/// Backend selected by configuration after probing the remote service
///
/// Like [`backend_from_config`], but a configured remote service that fails
/// its health check is skipped and generation stays local.
pub async fn available_backend(config: &SynthConfig) -> Result<Box<dyn GenerationBackend>> {
    let Some(url) = config.backend.remote_url.as_deref().filter(|url| !url.trim().is_empty()) else {
        return Ok(Box::new(LocalBackend::from_config(config)));
    };

    let remote = RemoteBackend::new(url, Duration::from_secs(config.backend.timeout_seconds))?;
    match remote.health_check().await {
        Ok(true) => {
            log::info!("Using remote generation at {} with local fallback", remote.base_url());
            let local = Box::new(LocalBackend::from_config(config));
            Ok(Box::new(FallbackBackend::new(Box::new(remote), local)))
        }
        Ok(false) => {
            log::warn!("Remote service at {} is unhealthy; generating locally", remote.base_url());
            Ok(Box::new(LocalBackend::from_config(config)))
        }
        Err(e) => {
            log::warn!("Remote service at {} is unreachable ({e}); generating locally", remote.base_url());
            Ok(Box::new(LocalBackend::from_config(config)))
        }
    }
}
