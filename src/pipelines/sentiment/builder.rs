use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::models::{DistilBertPolarityModel, ModernBertPolarityModel, ModernBertSize};
use crate::pipelines::cache::{global_cache, ModelOptions};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

use super::lexicon::LexiconScorer;
use super::model::PolarityModel;
use super::pipeline::SentimentPipeline;

/// Default records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default worker-pool size.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Which scoring backend a pipeline uses. A configuration value: pick one,
/// pass it to [`SentimentPipelineBuilder::new`], and the built pipeline is
/// interchangeable with any other backend's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// DistilBERT fine-tuned on SST-2.
    DistilBert,
    /// ModernBERT multilingual sentiment classifier.
    ModernBert(ModernBertSize),
    /// In-crate lexicon analyzer; no model download, no device.
    Lexicon,
}

enum BackendSource {
    Preset(Backend),
    Custom(Arc<dyn PolarityModel>),
}

/// Builder for creating [`SentimentPipeline`] instances.
///
/// # Examples
///
/// ```rust,no_run
/// use review_sentiment::sentiment::{ModernBertSize, SentimentPipelineBuilder};
///
/// # fn main() -> review_sentiment::error::Result<()> {
/// let pipeline = SentimentPipelineBuilder::modernbert(ModernBertSize::Base)
///     .cuda(0)
///     .batch_size(20)
///     .max_concurrency(8)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SentimentPipelineBuilder {
    source: BackendSource,
    device_request: DeviceRequest,
    batch_size: usize,
    max_concurrency: usize,
}

impl SentimentPipelineBuilder {
    /// Creates a builder for the given backend.
    pub fn new(backend: Backend) -> Self {
        Self {
            source: BackendSource::Preset(backend),
            device_request: DeviceRequest::Cpu,
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Creates a builder for the DistilBERT SST-2 backend.
    pub fn distilbert() -> Self {
        Self::new(Backend::DistilBert)
    }

    /// Creates a builder for a ModernBERT sentiment backend.
    pub fn modernbert(size: ModernBertSize) -> Self {
        Self::new(Backend::ModernBert(size))
    }

    /// Creates a builder for the lexicon backend.
    pub fn lexicon() -> Self {
        Self::new(Backend::Lexicon)
    }

    /// Creates a builder around an already-constructed backend.
    pub fn with_model(model: Arc<dyn PolarityModel>) -> Self {
        Self {
            source: BackendSource::Custom(model),
            device_request: DeviceRequest::Cpu,
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Use CPU for inference (default).
    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    /// Use a specific CUDA GPU for inference.
    pub fn cuda(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    /// Records per batch. Must be at least 1; defaults to 20.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Worker-pool size. Must be at least 1; defaults to 8.
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Builds the pipeline, loading the backend resource up front.
    ///
    /// Fails fast: an unloadable model, tokenizer, or device surfaces as
    /// [`PipelineError::BackendUnavailable`] before any record is scored.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Configuration`] for a zero `batch_size` or
    /// `max_concurrency`; [`PipelineError::BackendUnavailable`] when backend
    /// initialization fails.
    pub fn build(self) -> Result<SentimentPipeline> {
        if self.batch_size == 0 {
            return Err(PipelineError::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(PipelineError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let model: Arc<dyn PolarityModel> = match self.source {
            BackendSource::Custom(model) => model,
            BackendSource::Preset(Backend::Lexicon) => Arc::new(LexiconScorer::new()),
            BackendSource::Preset(Backend::DistilBert) => {
                let device = self.device_request.clone().resolve()?;
                let key = format!("distilbert-sst2-{:?}", device.location());
                global_cache()
                    .get_or_create(&key, || DistilBertPolarityModel::new(device.clone()))
                    .map_err(backend_unavailable)?
            }
            BackendSource::Preset(Backend::ModernBert(size)) => {
                let device = self.device_request.clone().resolve()?;
                let key = build_cache_key(&size, &device);
                global_cache()
                    .get_or_create(&key, || ModernBertPolarityModel::new(size, device.clone()))
                    .map_err(backend_unavailable)?
            }
        };

        Ok(SentimentPipeline {
            model,
            batch_size: self.batch_size,
            max_concurrency: self.max_concurrency,
        })
    }
}

impl ModelOptions for ModernBertSize {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

/// Initialization failures surface as `BackendUnavailable` whatever their
/// proximate cause; an already-tagged error passes through untouched.
fn backend_unavailable(e: PipelineError) -> PipelineError {
    match e {
        e @ PipelineError::BackendUnavailable(_) => e,
        other => PipelineError::BackendUnavailable(other.to_string()),
    }
}
