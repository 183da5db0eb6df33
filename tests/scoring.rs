//! Scoring pipeline contract tests over an instrumented backend: ordering,
//! batching equivalence, truncation determinism, and failure isolation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use review_sentiment::error::{PipelineError, Result};
use review_sentiment::sentiment::{
    PolarityModel, SentimentPipelineBuilder, MAX_INPUT_CHARS,
};

/// Deterministic backend: the score of a text is its numeric value when it
/// parses, else its character count. An optional per-batch delay schedule
/// forces workers to complete out of submission order.
struct InstrumentedModel {
    delays: Vec<Duration>,
    calls: AtomicUsize,
    poison: Option<&'static str>,
}

impl InstrumentedModel {
    fn plain() -> Self {
        Self {
            delays: Vec::new(),
            calls: AtomicUsize::new(0),
            poison: None,
        }
    }

    fn with_delays(delays: Vec<Duration>) -> Self {
        Self {
            delays,
            calls: AtomicUsize::new(0),
            poison: None,
        }
    }

    fn with_poison(token: &'static str) -> Self {
        Self {
            delays: Vec::new(),
            calls: AtomicUsize::new(0),
            poison: Some(token),
        }
    }
}

impl PolarityModel for InstrumentedModel {
    fn name(&self) -> &'static str {
        "instrumented"
    }

    fn score_batch(&self, texts: &[&str]) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(&delay) = self.delays.get(call % self.delays.len().max(1)) {
            std::thread::sleep(delay);
        }
        if let Some(token) = self.poison {
            if texts.iter().any(|t| t.contains(token)) {
                return Err(PipelineError::Unexpected("poisoned batch".to_string()));
            }
        }
        Ok(texts
            .iter()
            .map(|t| t.parse::<f32>().unwrap_or(t.chars().count() as f32))
            .collect())
    }
}

fn numbered_texts(n: usize) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

fn as_refs(texts: &[String]) -> Vec<&str> {
    texts.iter().map(String::as_str).collect()
}

#[test]
fn order_is_preserved_under_out_of_order_completion() {
    // Descending delays: the first-submitted batches finish last.
    let delays = (0..10)
        .rev()
        .map(|i| Duration::from_millis(i * 10))
        .collect();
    let pipeline = SentimentPipelineBuilder::with_model(Arc::new(
        InstrumentedModel::with_delays(delays),
    ))
    .batch_size(5)
    .max_concurrency(8)
    .build()
    .unwrap();

    let texts = numbered_texts(50);
    let output = pipeline.score(&as_refs(&texts)).unwrap();

    let expected: Vec<f32> = (0..50).map(|i| i as f32).collect();
    assert_eq!(output.scores, expected);
}

#[test]
fn batched_equals_unbatched() {
    let texts = numbered_texts(23);

    let one_shot = SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
        .batch_size(23)
        .build()
        .unwrap()
        .score(&as_refs(&texts))
        .unwrap();

    let singles = SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
        .batch_size(1)
        .build()
        .unwrap()
        .score(&as_refs(&texts))
        .unwrap();

    assert_eq!(one_shot.scores, singles.scores);
}

#[test]
fn concurrency_settings_do_not_change_results() {
    let texts = numbered_texts(50);

    let serial = SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
        .batch_size(1)
        .max_concurrency(1)
        .build()
        .unwrap()
        .score(&as_refs(&texts))
        .unwrap();

    let pooled = SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
        .batch_size(10)
        .max_concurrency(4)
        .build()
        .unwrap()
        .score(&as_refs(&texts))
        .unwrap();

    assert_eq!(serial.scores, pooled.scores);
}

#[test]
fn row_count_is_conserved() {
    for n in [1usize, 7, 20, 41, 100] {
        let texts = numbered_texts(n);
        let pipeline =
            SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
                .batch_size(8)
                .max_concurrency(3)
                .build()
                .unwrap();
        let output = pipeline.score(&as_refs(&texts)).unwrap();
        assert_eq!(output.scores.len(), n);
        assert_eq!(output.stats.items_processed, n);
        assert_eq!(output.stats.batches, n.div_ceil(8));
    }
}

#[test]
fn empty_input_scores_nothing() {
    let pipeline = SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
        .build()
        .unwrap();
    let output = pipeline.score(&[]).unwrap();
    assert!(output.scores.is_empty());
    assert_eq!(output.stats.batches, 0);
}

#[test]
fn truncation_is_deterministic_and_idempotent() {
    // The backend scores by character count, so equal scores mean the model
    // saw equal inputs.
    let long = "x".repeat(MAX_INPUT_CHARS * 3);
    let prefix: String = long.chars().take(MAX_INPUT_CHARS).collect();

    let pipeline = SentimentPipelineBuilder::with_model(Arc::new(InstrumentedModel::plain()))
        .build()
        .unwrap();

    let first = pipeline.score(&[long.as_str()]).unwrap();
    let second = pipeline.score(&[long.as_str()]).unwrap();
    let prefix_only = pipeline.score(&[prefix.as_str()]).unwrap();

    assert_eq!(first.scores, second.scores);
    assert_eq!(first.scores, prefix_only.scores);
    assert_eq!(first.scores[0], MAX_INPUT_CHARS as f32);
}

#[test]
fn failing_batch_is_isolated_to_its_record_range() {
    let pipeline = SentimentPipelineBuilder::with_model(Arc::new(
        InstrumentedModel::with_poison("poison"),
    ))
    .batch_size(10)
    .max_concurrency(4)
    .build()
    .unwrap();

    // Poisoned record at index 25 lands in the third batch: records 20..30.
    let texts: Vec<String> = (0..50)
        .map(|i| {
            if i == 25 {
                "poison".to_string()
            } else {
                i.to_string()
            }
        })
        .collect();

    let err = pipeline.score(&as_refs(&texts)).unwrap_err();
    match err {
        PipelineError::BatchScoring { failed } => {
            assert_eq!(failed, vec![(20, 30)]);
        }
        other => panic!("expected BatchScoring, got {other}"),
    }
}

#[test]
fn final_partial_batch_range_is_clamped() {
    let pipeline = SentimentPipelineBuilder::with_model(Arc::new(
        InstrumentedModel::with_poison("poison"),
    ))
    .batch_size(8)
    .max_concurrency(2)
    .build()
    .unwrap();

    // 19 records: batches are 0..8, 8..16, 16..19. Poison the final one.
    let mut texts = numbered_texts(19);
    texts[18] = "poison".to_string();

    let err = pipeline.score(&as_refs(&texts)).unwrap_err();
    match err {
        PipelineError::BatchScoring { failed } => assert_eq!(failed, vec![(16, 19)]),
        other => panic!("expected BatchScoring, got {other}"),
    }
}

#[test]
fn lexicon_backend_flows_through_the_pipeline() {
    let pipeline = SentimentPipelineBuilder::lexicon()
        .batch_size(2)
        .build()
        .unwrap();

    let output = pipeline
        .score(&["great product", "terrible, broke immediately", "the box arrived"])
        .unwrap();

    assert_eq!(output.scores.len(), 3);
    assert!(output.scores[0] > 0.0);
    assert!(output.scores[1] < 0.0);
    assert_eq!(output.scores[2], 0.0);
    assert!(output.scores.iter().all(|s| (-1.0..=1.0).contains(s)));
}
