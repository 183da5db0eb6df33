use crate::error::Result;

/// A sentiment scoring backend: one signed polarity score per text.
///
/// Implementations must be safe for concurrent invocation - the pipeline
/// shares one instance read-only across all pool workers.
pub trait PolarityModel: Send + Sync {
    /// Stable short name, used to tag score columns in the persisted table.
    fn name(&self) -> &'static str;

    /// Score a batch of texts.
    ///
    /// Returns exactly one score per input text, in input order. A failure
    /// fails the whole batch; the pipeline reports the affected record range.
    fn score_batch(&self, texts: &[&str]) -> Result<Vec<f32>>;

    /// Backends with negligible per-call cost take the single-threaded
    /// per-record path instead of the worker pool.
    fn prefers_sequential(&self) -> bool {
        false
    }
}
