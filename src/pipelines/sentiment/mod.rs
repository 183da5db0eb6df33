//! Sentiment polarity scoring pipeline.
//!
//! Assigns every review text a signed polarity score through one of several
//! interchangeable backends: two pretrained neural classifiers (DistilBERT,
//! ModernBERT) and a lexicon analyzer. Neural scores are
//! `P(positive) - P(negative)` over softmax-normalized class probabilities,
//! range `(-1, 1)`; the lexicon compound score is in `[-1, 1]`. Scales are
//! backend-specific and never conflated - every score column carries the
//! backend's name.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use review_sentiment::sentiment::SentimentPipelineBuilder;
//!
//! # fn main() -> review_sentiment::error::Result<()> {
//! let pipeline = SentimentPipelineBuilder::distilbert()
//!     .batch_size(20)
//!     .max_concurrency(8)
//!     .build()?;
//!
//! let output = pipeline.score(&["I absolutely love this product!"])?;
//! println!("polarity: {:+.3}", output.scores[0]);
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Input texts are split into contiguous batches, fanned out over a
//! fixed-size worker pool, and reassembled by batch index: `scores[i]` always
//! corresponds to input `i`, regardless of worker completion order.
//!
//! # Supported Backends
//!
//! | Backend | Source | Builder Method |
//! |---------|--------|----------------|
//! | DistilBERT | `distilbert-base-uncased-finetuned-sst-2-english` | [`SentimentPipelineBuilder::distilbert`] |
//! | ModernBERT | `clapAI/modernBERT-{base,large}-multilingual-sentiment` | [`SentimentPipelineBuilder::modernbert`] |
//! | Lexicon | in-crate valence table | [`SentimentPipelineBuilder::lexicon`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod lexicon;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::ModernBertSize;
pub use crate::pipelines::stats::ScoringStats;
pub use builder::{Backend, SentimentPipelineBuilder};
pub use lexicon::LexiconScorer;
pub use model::PolarityModel;
pub use pipeline::{ScoringOutput, SentimentPipeline, MAX_INPUT_CHARS};
