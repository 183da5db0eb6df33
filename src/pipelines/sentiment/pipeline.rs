use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::pipelines::stats::ScoringStats;

use super::model::PolarityModel;

/// Texts are truncated to this many characters (prefix kept) before scoring.
pub const MAX_INPUT_CHARS: usize = 512;

/// Output of [`SentimentPipeline::score`].
#[derive(Debug)]
pub struct ScoringOutput {
    /// One polarity score per input text, in input order.
    pub scores: Vec<f32>,
    /// Execution statistics.
    pub stats: ScoringStats,
}

/// Scores review texts for sentiment polarity.
///
/// Construct with [`SentimentPipelineBuilder`](super::SentimentPipelineBuilder).
/// The pipeline holds the backend resource for its lifetime and shares it
/// read-only across pool workers; nothing persists between calls beyond the
/// loaded backend.
///
/// # Examples
///
/// ```rust,no_run
/// # use review_sentiment::sentiment::{SentimentPipelineBuilder, ModernBertSize};
/// # fn main() -> review_sentiment::error::Result<()> {
/// let pipeline = SentimentPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
///
/// let output = pipeline.score(&["Best purchase I've ever made!", "Complete waste of money."])?;
/// assert!(output.scores[0] > output.scores[1]);
/// # Ok(())
/// # }
/// ```
pub struct SentimentPipeline {
    pub(crate) model: Arc<dyn PolarityModel>,
    pub(crate) batch_size: usize,
    pub(crate) max_concurrency: usize,
}

impl std::fmt::Debug for SentimentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentPipeline")
            .field("model", &self.model.name())
            .field("batch_size", &self.batch_size)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

impl SentimentPipeline {
    /// The backend's stable name, used as the score-column tag.
    pub fn backend_name(&self) -> &'static str {
        self.model.name()
    }

    /// Score every text, returning one polarity per input in input order.
    ///
    /// Texts are truncated to their [`MAX_INPUT_CHARS`]-character prefix,
    /// split into contiguous `batch_size` chunks, and fanned out over a pool
    /// of `max_concurrency` workers. Workers may finish out of order; results
    /// are reassembled by batch index before returning, so concurrency never
    /// affects output order or values. The pool lives only for this call.
    ///
    /// # Errors
    ///
    /// [`PipelineError::BatchScoring`] when any batch's inference call fails;
    /// the error lists the half-open record ranges left unscored. No partial
    /// score vector is returned.
    pub fn score(&self, texts: &[&str]) -> Result<ScoringOutput> {
        let stats = ScoringStats::start();
        if texts.is_empty() {
            return Ok(ScoringOutput {
                scores: Vec::new(),
                stats: stats.finish(0, 0),
            });
        }

        let truncated: Vec<&str> = texts
            .iter()
            .map(|t| truncate_chars(t, MAX_INPUT_CHARS))
            .collect();
        let batch_count = truncated.len().div_ceil(self.batch_size);

        let keyed = if self.model.prefers_sequential() || self.max_concurrency == 1 {
            self.score_sequential(&truncated)
        } else {
            self.score_pooled(&truncated)?
        };

        let scores = self.reassemble(texts.len(), keyed)?;
        debug!(
            records = texts.len(),
            batches = batch_count,
            backend = self.model.name(),
            "scoring complete"
        );
        Ok(ScoringOutput {
            scores,
            stats: stats.finish(texts.len(), batch_count),
        })
    }

    /// Batches are scored in submission order on the caller's thread. Used for
    /// backends with negligible per-call cost and for `max_concurrency = 1`.
    fn score_sequential(&self, texts: &[&str]) -> Vec<(usize, Result<Vec<f32>>)> {
        texts
            .chunks(self.batch_size)
            .enumerate()
            .map(|(index, batch)| (index, self.model.score_batch(batch)))
            .collect()
    }

    /// Submit every batch to a fixed-size worker pool and join on all of them.
    /// Completion order is arbitrary; each result stays keyed by batch index.
    fn score_pooled(&self, texts: &[&str]) -> Result<Vec<(usize, Result<Vec<f32>>)>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency)
            .build()
            .map_err(|e| {
                PipelineError::Unexpected(format!("failed building worker pool: {e}"))
            })?;

        let model = &self.model;
        Ok(pool.install(|| {
            texts
                .par_chunks(self.batch_size)
                .enumerate()
                .map(|(index, batch)| (index, model.score_batch(batch)))
                .collect()
        }))
    }

    /// Concatenate per-batch results in ascending batch-index order. Any
    /// failed batch is isolated to its record range and reported; completed
    /// batches are never silently dropped into a partial output.
    fn reassemble(
        &self,
        total: usize,
        mut keyed: Vec<(usize, Result<Vec<f32>>)>,
    ) -> Result<Vec<f32>> {
        keyed.sort_by_key(|(index, _)| *index);

        let mut scores = Vec::with_capacity(total);
        let mut failed = Vec::new();
        for (index, result) in keyed {
            let start = index * self.batch_size;
            let end = (start + self.batch_size).min(total);
            match result {
                Ok(batch_scores) => {
                    if batch_scores.len() != end - start {
                        return Err(PipelineError::Unexpected(format!(
                            "backend returned {} scores for a batch of {}",
                            batch_scores.len(),
                            end - start
                        )));
                    }
                    scores.extend(batch_scores);
                }
                Err(e) => {
                    warn!(batch = index, start, end, error = %e, "batch inference failed");
                    failed.push((start, end));
                }
            }
        }

        if !failed.is_empty() {
            return Err(PipelineError::BatchScoring { failed });
        }
        debug_assert_eq!(scores.len(), total);
        Ok(scores)
    }
}

/// Deterministic, char-boundary-safe prefix truncation.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_prefix() {
        let text = "a".repeat(600);
        assert_eq!(truncate_chars(&text, 512).len(), 512);
        assert_eq!(truncate_chars("short", 512), "short");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(600);
        let truncated = truncate_chars(&text, 512);
        assert_eq!(truncated.chars().count(), 512);
    }
}
