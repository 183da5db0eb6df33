//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust,no_run
/// use review_sentiment::error::PipelineError;
///
/// fn handle_error(e: PipelineError) {
///     match &e {
///         PipelineError::DataUnavailable(_) => {
///             // Dataset or config could not be resolved - check the identifiers
///         }
///         PipelineError::BackendUnavailable(_) => {
///             // Model/device failed to initialize - nothing was scored
///         }
///         PipelineError::BatchScoring { failed } => {
///             // Inference failed for these record ranges; they remain unscored
///             eprintln!("unscored ranges: {failed:?}");
///         }
///         PipelineError::Tokenization(_) => {
///             // Bad input text - fix and retry
///         }
///         _ => {
///             // Remaining variants are fatal for the run
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Dataset or config could not be resolved or fetched. No retry.
    #[error("dataset unavailable: {0}")]
    DataUnavailable(String),

    /// A record's fields could not be normalized. Fails the whole stage.
    #[error("malformed record at row {index}: {reason}")]
    MalformedRecord {
        /// Zero-based row index in loader order.
        index: usize,
        /// What failed to normalize.
        reason: String,
    },

    /// Scoring backend failed to initialize. Fails before any batch is scored.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// One or more batch inference calls failed. `failed` holds the
    /// half-open record ranges `(start, end)` left unscored.
    #[error("batch scoring failed; unscored record ranges: {failed:?}")]
    BatchScoring {
        /// Half-open `(start, end)` record index ranges that were not scored.
        failed: Vec<(usize, usize)>,
    },

    /// Tokenization failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Invalid caller-supplied parameter.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),

    /// Filesystem failure while reading or writing an artifact.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// CSV encode/decode failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::DataUnavailable(format!("HuggingFace API error: {value}"))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}
