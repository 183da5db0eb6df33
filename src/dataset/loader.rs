use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

use super::ReviewRecord;

const SHARD_EXTENSIONS: &[&str] = &["jsonl", "parquet"];

/// Fetches a named review dataset config from the Hugging Face Hub and
/// materializes it as an ordered, in-memory record collection.
///
/// Shards are resolved from the dataset repository's file listing, downloaded
/// through the hub cache, and decoded in shard-path order. Row order within a
/// shard is file order; the loader never reorders or drops rows.
///
/// # Examples
///
/// ```rust,no_run
/// use review_sentiment::dataset::ReviewDatasetLoader;
///
/// # fn main() -> review_sentiment::error::Result<()> {
/// let reviews = ReviewDatasetLoader::new("McAuley-Lab/Amazon-Reviews-2023", "raw_review_All_Beauty")
///     .with_max_rows(10_000)
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReviewDatasetLoader {
    dataset: String,
    config: String,
    max_rows: Option<usize>,
}

impl ReviewDatasetLoader {
    /// Create a loader for `dataset` (e.g. `McAuley-Lab/Amazon-Reviews-2023`)
    /// and the named `config` (e.g. `raw_review_All_Beauty`).
    pub fn new(dataset: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            config: config.into(),
            max_rows: None,
        }
    }

    /// Cap the number of rows loaded. Rows beyond the cap are not fetched.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Download and decode the full record collection.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DataUnavailable`] when the dataset or config resolves
    /// to no shard files or the hub cannot be reached;
    /// [`PipelineError::MalformedRecord`] when a row cannot be normalized.
    pub fn load(&self) -> Result<Vec<ReviewRecord>> {
        let api = ApiBuilder::new().with_progress(true).build().map_err(|e| {
            PipelineError::DataUnavailable(format!("failed building hub client: {e}"))
        })?;
        let repo = api.repo(Repo::new(self.dataset.clone(), RepoType::Dataset));

        info!(dataset = %self.dataset, config = %self.config, "listing dataset shards");
        let repo_info = repo.info().map_err(|e| {
            PipelineError::DataUnavailable(format!(
                "failed reading repository info for '{}': {e}",
                self.dataset
            ))
        })?;

        let mut shard_paths: Vec<String> = repo_info
            .siblings
            .into_iter()
            .map(|s| s.rfilename)
            .filter(|path| self.matches_config(path) && has_accepted_extension(path))
            .collect();
        shard_paths.sort();

        if shard_paths.is_empty() {
            return Err(PipelineError::DataUnavailable(format!(
                "no shard files for config '{}' in dataset '{}'",
                self.config, self.dataset
            )));
        }

        let mut records = Vec::new();
        for (ordinal, remote_path) in shard_paths.iter().enumerate() {
            if self.max_rows.is_some_and(|cap| records.len() >= cap) {
                break;
            }
            info!(shard = %remote_path, ordinal, "downloading shard");
            let local = repo.get(remote_path).map_err(|e| {
                PipelineError::DataUnavailable(format!(
                    "failed downloading '{remote_path}' from '{}': {e}",
                    self.dataset
                ))
            })?;
            self.decode_shard(&local, &mut records)?;
            debug!(rows = records.len(), "rows decoded so far");
        }

        if let Some(cap) = self.max_rows {
            records.truncate(cap);
        }
        info!(rows = records.len(), "dataset loaded");
        Ok(records)
    }

    /// A shard belongs to this config when its path contains the config name,
    /// or the config name with its access-kind prefix stripped (the raw
    /// review/meta configs name files by category only).
    fn matches_config(&self, path: &str) -> bool {
        if path.contains(&self.config) {
            return true;
        }
        for prefix in ["raw_review_", "raw_meta_"] {
            if let Some(stripped) = self.config.strip_prefix(prefix) {
                return path.contains(stripped);
            }
        }
        false
    }

    fn decode_shard(&self, path: &Path, out: &mut Vec<ReviewRecord>) -> Result<()> {
        let is_parquet = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
        if is_parquet {
            self.decode_parquet(path, out)
        } else {
            self.decode_jsonl(path, out)
        }
    }

    fn decode_jsonl(&self, path: &Path, out: &mut Vec<ReviewRecord>) -> Result<()> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        for line in reader.lines() {
            if self.max_rows.is_some_and(|cap| out.len() >= cap) {
                return Ok(());
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let index = out.len();
            let value: Value =
                serde_json::from_str(&line).map_err(|e| PipelineError::MalformedRecord {
                    index,
                    reason: format!("invalid JSON row: {e}"),
                })?;
            out.push(parse_record(index, &value)?);
        }
        Ok(())
    }

    fn decode_parquet(&self, path: &Path, out: &mut Vec<ReviewRecord>) -> Result<()> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file).map_err(|e| {
            PipelineError::DataUnavailable(format!(
                "failed reading parquet shard {}: {e}",
                path.display()
            ))
        })?;
        let rows = reader.get_row_iter(None).map_err(|e| {
            PipelineError::DataUnavailable(format!(
                "failed iterating parquet shard {}: {e}",
                path.display()
            ))
        })?;
        for row in rows {
            if self.max_rows.is_some_and(|cap| out.len() >= cap) {
                return Ok(());
            }
            let index = out.len();
            let row = row.map_err(|e| PipelineError::DataUnavailable(format!(
                "failed reading parquet row {index} in {}: {e}",
                path.display()
            )))?;
            let value = row.to_json_value();
            out.push(parse_record(index, &value)?);
        }
        Ok(())
    }
}

fn has_accepted_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SHARD_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Normalize one decoded row into a [`ReviewRecord`].
///
/// `rating`, `text` and `timestamp` are required; identifier fields default to
/// empty and `helpful_vote` stays absent when the source row omits it.
pub(crate) fn parse_record(index: usize, value: &Value) -> Result<ReviewRecord> {
    let obj = value
        .as_object()
        .ok_or_else(|| PipelineError::MalformedRecord {
            index,
            reason: "row is not a JSON object".to_string(),
        })?;

    let rating = obj
        .get("rating")
        .and_then(Value::as_f64)
        .ok_or_else(|| PipelineError::MalformedRecord {
            index,
            reason: "missing or non-numeric 'rating'".to_string(),
        })? as f32;

    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::MalformedRecord {
            index,
            reason: "missing 'text'".to_string(),
        })?
        .to_string();

    let timestamp = obj
        .get("timestamp")
        .and_then(Value::as_i64)
        .ok_or_else(|| PipelineError::MalformedRecord {
            index,
            reason: "missing or non-integer 'timestamp'".to_string(),
        })?;

    let helpful_vote = obj
        .get("helpful_vote")
        .and_then(Value::as_u64)
        .map(|v| v.min(u32::MAX as u64) as u32);

    Ok(ReviewRecord {
        rating,
        title: string_field(obj, "title"),
        text,
        images: image_urls(obj.get("images")),
        asin: string_field(obj, "asin"),
        parent_asin: string_field(obj, "parent_asin"),
        user_id: string_field(obj, "user_id"),
        timestamp,
        helpful_vote,
        verified_purchase: obj
            .get("verified_purchase")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Image entries arrive either as plain URL strings or as objects with
/// per-size URL fields; keep one URL per attached image.
fn image_urls(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(url) => Some(url.clone()),
            Value::Object(fields) => ["large_image_url", "medium_image_url", "small_image_url"]
                .iter()
                .find_map(|k| fields.get(*k).and_then(Value::as_str))
                .or_else(|| fields.values().find_map(Value::as_str))
                .map(str::to_string),
            _ => None,
        })
        .collect()
}
