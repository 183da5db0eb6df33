//! Sentiment study pipelines for Amazon product reviews.
//!
//! Powered by [Candle](https://github.com/huggingface/candle), with the review corpus
//! fetched from the Hugging Face Hub. The crate covers the four stages of the study:
//! loading a review dataset, deriving tabular features, scoring review text with an
//! interchangeable sentiment backend, and fitting classical models on the scored table.
//!
//! ```rust,no_run
//! use review_sentiment::dataset::{derive_features, ReviewDatasetLoader};
//! use review_sentiment::sentiment::SentimentPipelineBuilder;
//!
//! # fn main() -> review_sentiment::error::Result<()> {
//! let reviews = ReviewDatasetLoader::new("McAuley-Lab/Amazon-Reviews-2023", "raw_review_All_Beauty")
//!     .load()?;
//! let records = derive_features(reviews)?;
//!
//! let pipeline = SentimentPipelineBuilder::lexicon().build()?;
//! let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
//! let output = pipeline.score(&texts)?;
//! assert_eq!(output.scores.len(), records.len());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod models;

// ============ Public API ============

pub mod analysis;
pub mod dataset;
pub mod error;
pub mod interchange;
pub mod pipelines;
pub mod report;

pub use pipelines::sentiment;
