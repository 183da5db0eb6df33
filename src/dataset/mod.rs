//! Review corpus loading and feature derivation.
//!
//! The loader materializes a Hugging Face review dataset as an ordered
//! [`Vec<ReviewRecord>`]; [`derive_features`] maps it row-wise into
//! [`FeatureRecord`]s. Both stages conserve row count and order.

// ============ Internal API ============

pub(crate) mod features;
pub(crate) mod loader;

// ============ Public API ============

pub use features::derive_features;
pub use loader::ReviewDatasetLoader;

use serde::{Deserialize, Serialize};

/// One raw product review, as loaded from the corpus. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Star rating, 1.0 to 5.0.
    pub rating: f32,
    /// Review headline.
    #[serde(default)]
    pub title: String,
    /// Free-text review body.
    pub text: String,
    /// URLs of attached images, possibly empty.
    #[serde(default)]
    pub images: Vec<String>,
    /// Product identifier.
    #[serde(default)]
    pub asin: String,
    /// Parent product identifier (variant group).
    #[serde(default)]
    pub parent_asin: String,
    /// Reviewer identifier.
    #[serde(default)]
    pub user_id: String,
    /// Review time as milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Helpful-vote count; absent in some rows.
    #[serde(default)]
    pub helpful_vote: Option<u32>,
    /// Whether the purchase was verified.
    #[serde(default)]
    pub verified_purchase: bool,
}

/// One review with its derived scalar columns, as a single flat table row.
///
/// Created once by [`derive_features`], one-to-one and order-aligned with the
/// input records; the raw flag/count columns are replaced by their normalized
/// forms, matching the table the downstream models consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Star rating, 1.0 to 5.0.
    pub rating: f32,
    /// Review headline.
    #[serde(default)]
    pub title: String,
    /// Free-text review body.
    pub text: String,
    /// URLs of attached images, possibly empty.
    #[serde(default)]
    pub images: Vec<String>,
    /// Product identifier.
    #[serde(default)]
    pub asin: String,
    /// Parent product identifier (variant group).
    #[serde(default)]
    pub parent_asin: String,
    /// Reviewer identifier.
    #[serde(default)]
    pub user_id: String,
    /// Review time as milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Helpful-vote count with absent values mapped to 0.
    pub helpful_vote: u32,
    /// 1 if the purchase was verified, else 0.
    pub verified_purchase: u8,
    /// Character count of the review body.
    pub review_length: usize,
    /// 1 if any image is attached, else 0.
    pub has_images: u8,
    /// Calendar year of the review timestamp (UTC).
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Day of week, Monday = 0 through Sunday = 6.
    pub weekday: u32,
}
