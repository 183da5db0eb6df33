//! The persisted scored table bridging the scorer and the modeling stage.
//!
//! A [`ScoredRecord`] is one feature row plus one score column per backend
//! that scored it; columns are named `sentiment_score_<backend>` so scores
//! from different backends are never conflated. Two equivalent encodings are
//! supported - comma-separated tabular and newline-delimited JSON records -
//! and both round-trip the same schema, row order, and score values.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::FeatureRecord;
use crate::error::{PipelineError, Result};

/// Prefix shared by every score column.
pub const SCORE_COLUMN_PREFIX: &str = "sentiment_score";

/// Fixed feature columns, in artifact order.
const FEATURE_COLUMNS: &[&str] = &[
    "rating",
    "title",
    "text",
    "images",
    "asin",
    "parent_asin",
    "user_id",
    "timestamp",
    "helpful_vote",
    "verified_purchase",
    "review_length",
    "has_images",
    "year",
    "month",
    "day",
    "weekday",
];

/// The column name for scores produced by `backend`.
pub fn score_column(backend: &str) -> String {
    format!("{SCORE_COLUMN_PREFIX}_{backend}")
}

/// One row of the scored table: the feature row plus its score columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The feature row.
    #[serde(flatten)]
    pub record: FeatureRecord,
    /// Score columns, keyed by full column name (`sentiment_score_<backend>`).
    #[serde(flatten)]
    pub scores: BTreeMap<String, f32>,
}

impl ScoredRecord {
    /// The score produced by `backend`, if present.
    pub fn score(&self, backend: &str) -> Option<f32> {
        self.scores.get(&score_column(backend)).copied()
    }
}

/// Attach one backend's ordered scores to the feature rows, producing the
/// scored table. `scores[i]` is paired with `records[i]`.
///
/// # Errors
///
/// [`PipelineError::Unexpected`] when the score and record counts differ -
/// a length mismatch means a record would be dropped or left unscored.
pub fn attach_scores(
    records: Vec<FeatureRecord>,
    backend: &str,
    scores: &[f32],
) -> Result<Vec<ScoredRecord>> {
    check_lengths(records.len(), scores.len())?;
    let column = score_column(backend);
    Ok(records
        .into_iter()
        .zip(scores)
        .map(|(record, &score)| ScoredRecord {
            record,
            scores: BTreeMap::from([(column.clone(), score)]),
        })
        .collect())
}

/// Add a further backend's ordered scores as a new column on an existing
/// scored table.
pub fn add_scores(table: &mut [ScoredRecord], backend: &str, scores: &[f32]) -> Result<()> {
    check_lengths(table.len(), scores.len())?;
    let column = score_column(backend);
    for (row, &score) in table.iter_mut().zip(scores) {
        row.scores.insert(column.clone(), score);
    }
    Ok(())
}

fn check_lengths(records: usize, scores: usize) -> Result<()> {
    if records != scores {
        return Err(PipelineError::Unexpected(format!(
            "{scores} scores for {records} records"
        )));
    }
    Ok(())
}

/// Score columns present in the table, in column order. Every row must carry
/// the same set; a ragged table is not schema-stable.
fn score_columns(table: &[ScoredRecord]) -> Result<Vec<String>> {
    let Some(first) = table.first() else {
        return Ok(Vec::new());
    };
    let columns: Vec<String> = first.scores.keys().cloned().collect();
    for (i, row) in table.iter().enumerate() {
        if row.scores.len() != columns.len() || !columns.iter().all(|c| row.scores.contains_key(c))
        {
            return Err(PipelineError::Unexpected(format!(
                "row {i} does not carry the table's score columns {columns:?}"
            )));
        }
    }
    Ok(columns)
}

// ============ CSV encoding ============

/// Write the scored table as CSV. Image URLs are encoded as a JSON array in
/// their cell; all other cells are scalar.
pub fn write_csv(path: impl AsRef<Path>, table: &[ScoredRecord]) -> Result<()> {
    let columns = score_columns(table)?;
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let header: Vec<&str> = FEATURE_COLUMNS
        .iter()
        .copied()
        .chain(columns.iter().map(String::as_str))
        .collect();
    writer.write_record(&header)?;

    for row in table {
        let r = &row.record;
        let mut cells: Vec<String> = vec![
            r.rating.to_string(),
            r.title.clone(),
            r.text.clone(),
            serde_json::to_string(&r.images)?,
            r.asin.clone(),
            r.parent_asin.clone(),
            r.user_id.clone(),
            r.timestamp.to_string(),
            r.helpful_vote.to_string(),
            r.verified_purchase.to_string(),
            r.review_length.to_string(),
            r.has_images.to_string(),
            r.year.to_string(),
            r.month.to_string(),
            r.day.to_string(),
            r.weekday.to_string(),
        ];
        for column in &columns {
            cells.push(row.scores[column].to_string());
        }
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a scored table written by [`write_csv`], preserving row order.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<ScoredRecord>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let header = reader.headers()?.clone();

    let score_fields: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(SCORE_COLUMN_PREFIX))
        .map(|(i, name)| (i, name.to_string()))
        .collect();

    let field_index = |name: &str| -> Result<usize> {
        header.iter().position(|h| h == name).ok_or_else(|| {
            PipelineError::Unexpected(format!("CSV artifact is missing column '{name}'"))
        })
    };
    let mut indices = [0usize; 16];
    for (slot, name) in indices.iter_mut().zip(FEATURE_COLUMNS.iter().copied()) {
        *slot = field_index(name)?;
    }

    let mut table = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |i: usize| record.get(indices[i]).unwrap_or_default();
        let parse_err = |column: &str, e: &dyn std::fmt::Display| PipelineError::MalformedRecord {
            index: row_idx,
            reason: format!("unparseable '{column}': {e}"),
        };

        let feature = FeatureRecord {
            rating: cell(0).parse().map_err(|e| parse_err("rating", &e))?,
            title: cell(1).to_string(),
            text: cell(2).to_string(),
            images: serde_json::from_str(cell(3)).map_err(|e| parse_err("images", &e))?,
            asin: cell(4).to_string(),
            parent_asin: cell(5).to_string(),
            user_id: cell(6).to_string(),
            timestamp: cell(7).parse().map_err(|e| parse_err("timestamp", &e))?,
            helpful_vote: cell(8).parse().map_err(|e| parse_err("helpful_vote", &e))?,
            verified_purchase: cell(9)
                .parse()
                .map_err(|e| parse_err("verified_purchase", &e))?,
            review_length: cell(10)
                .parse()
                .map_err(|e| parse_err("review_length", &e))?,
            has_images: cell(11).parse().map_err(|e| parse_err("has_images", &e))?,
            year: cell(12).parse().map_err(|e| parse_err("year", &e))?,
            month: cell(13).parse().map_err(|e| parse_err("month", &e))?,
            day: cell(14).parse().map_err(|e| parse_err("day", &e))?,
            weekday: cell(15).parse().map_err(|e| parse_err("weekday", &e))?,
        };

        let mut scores = BTreeMap::new();
        for (i, name) in &score_fields {
            let raw = record.get(*i).unwrap_or_default();
            let value: f32 = raw.parse().map_err(|e| parse_err(name, &e))?;
            scores.insert(name.clone(), value);
        }

        table.push(ScoredRecord {
            record: feature,
            scores,
        });
    }
    Ok(table)
}

// ============ JSONL encoding ============

/// Write the scored table as newline-delimited JSON, one record per line.
pub fn write_jsonl(path: impl AsRef<Path>, table: &[ScoredRecord]) -> Result<()> {
    // Validate schema stability up front, as the CSV path does.
    score_columns(table)?;
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    for row in table {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a scored table written by [`write_jsonl`], preserving row order.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<ScoredRecord>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut table = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)?;
        let row: ScoredRecord =
            serde_json::from_value(value).map_err(|e| PipelineError::MalformedRecord {
                index,
                reason: format!("invalid scored record: {e}"),
            })?;
        table.push(row);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_row(text: &str, user: &str) -> FeatureRecord {
        FeatureRecord {
            rating: 4.0,
            title: "t".into(),
            text: text.into(),
            images: vec!["a.jpg".into()],
            asin: "B1".into(),
            parent_asin: "B0".into(),
            user_id: user.into(),
            timestamp: 1_577_836_800_000,
            helpful_vote: 2,
            verified_purchase: 1,
            review_length: text.chars().count(),
            has_images: 1,
            year: 2020,
            month: 1,
            day: 1,
            weekday: 2,
        }
    }

    #[test]
    fn attach_rejects_length_mismatch() {
        let rows = vec![feature_row("a", "u1")];
        assert!(attach_scores(rows, "lexicon", &[0.1, 0.2]).is_err());
    }

    #[test]
    fn attach_and_add_tag_columns() {
        let rows = vec![feature_row("a", "u1"), feature_row("b", "u2")];
        let mut table = attach_scores(rows, "distilbert", &[0.5, -0.5]).unwrap();
        add_scores(&mut table, "lexicon", &[0.1, -0.1]).unwrap();

        assert_eq!(table[0].score("distilbert"), Some(0.5));
        assert_eq!(table[1].score("lexicon"), Some(-0.1));
        assert_eq!(table[0].score("modernbert"), None);
    }

    #[test]
    fn ragged_score_columns_rejected() {
        let rows = vec![feature_row("a", "u1"), feature_row("b", "u2")];
        let mut table = attach_scores(rows, "lexicon", &[0.1, 0.2]).unwrap();
        table[1]
            .scores
            .insert(score_column("distilbert"), 0.9);
        assert!(score_columns(&table).is_err());
    }
}
