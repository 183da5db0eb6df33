//! Classical modeling over the scored table.
//!
//! This stage is a pure consumer of the persisted interchange artifact: it
//! assembles a design matrix from the metadata columns, thresholds a chosen
//! score column into sentiment labels, and fits the study's models -
//! multinomial logistic regression, gradient-boosted stumps, and panel
//! regressions - with evaluation metrics alongside.

// ============ Public API ============

pub mod boosting;
pub mod logistic;
pub mod metrics;
pub mod panel;
pub mod preprocessing;

pub use boosting::GradientBoostingClassifier;
pub use logistic::LogisticRegression;
pub use panel::{fixed_effects, pooled_ols, random_effects, PanelData, RegressionSummary};
pub use preprocessing::{train_test_split, StandardScaler};

use crate::interchange::ScoredRecord;

/// Positive-class threshold for the three-way label rule.
pub const POSITIVE_THRESHOLD: f32 = 0.35;

/// Negative-class threshold for the three-way label rule.
pub const NEGATIVE_THRESHOLD: f32 = -0.35;

/// Metadata columns used as model features, in design-matrix order.
pub const FEATURE_NAMES: &[&str] = &[
    "rating",
    "review_length",
    "helpful_vote",
    "verified_purchase",
    "has_images",
    "year",
    "month",
    "day",
    "weekday",
];

/// Three-way sentiment label: negative = 0, neutral = 1, positive = 2.
pub fn label_three_way(score: f32) -> usize {
    if score > POSITIVE_THRESHOLD {
        2
    } else if score < NEGATIVE_THRESHOLD {
        0
    } else {
        1
    }
}

/// Binary sentiment label: positive = 1 when the score is above zero.
pub fn label_binary(score: f32) -> usize {
    usize::from(score > 0.0)
}

/// Assemble the design matrix over [`FEATURE_NAMES`] for the whole table.
pub fn feature_matrix(table: &[ScoredRecord]) -> Vec<Vec<f32>> {
    table
        .iter()
        .map(|row| {
            let r = &row.record;
            vec![
                r.rating,
                r.review_length as f32,
                r.helpful_vote as f32,
                r.verified_purchase as f32,
                r.has_images as f32,
                r.year as f32,
                r.month as f32,
                r.day as f32,
                r.weekday as f32,
            ]
        })
        .collect()
}
