use chrono::{DateTime, Datelike};

use crate::error::{PipelineError, Result};

use super::{FeatureRecord, ReviewRecord};

/// Derive the tabular feature columns for every record.
///
/// Pure row-wise transform: no record is reordered, dropped, or duplicated.
///
/// # Errors
///
/// [`PipelineError::MalformedRecord`] when a record's timestamp does not
/// resolve to a valid UTC datetime.
pub fn derive_features(records: Vec<ReviewRecord>) -> Result<Vec<FeatureRecord>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, review)| derive_one(index, review))
        .collect()
}

fn derive_one(index: usize, review: ReviewRecord) -> Result<FeatureRecord> {
    let datetime = DateTime::from_timestamp_millis(review.timestamp).ok_or_else(|| {
        PipelineError::MalformedRecord {
            index,
            reason: format!("timestamp {} is out of range", review.timestamp),
        }
    })?;

    Ok(FeatureRecord {
        rating: review.rating,
        review_length: review.text.chars().count(),
        helpful_vote: review.helpful_vote.unwrap_or(0),
        verified_purchase: u8::from(review.verified_purchase),
        has_images: u8::from(!review.images.is_empty()),
        year: datetime.year(),
        month: datetime.month(),
        day: datetime.day(),
        weekday: datetime.weekday().num_days_from_monday(),
        title: review.title,
        text: review.text,
        images: review.images,
        asin: review.asin,
        parent_asin: review.parent_asin,
        user_id: review.user_id,
        timestamp: review.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(text: &str, timestamp: i64) -> ReviewRecord {
        ReviewRecord {
            rating: 5.0,
            title: String::new(),
            text: text.to_string(),
            images: Vec::new(),
            asin: "B0".into(),
            parent_asin: "B0".into(),
            user_id: "U0".into(),
            timestamp,
            helpful_vote: None,
            verified_purchase: false,
        }
    }

    #[test]
    fn decomposes_timestamp() {
        // 2020-01-01T00:00:00Z is a Wednesday.
        let records = derive_features(vec![review("hello", 1_577_836_800_000)]).unwrap();
        let r = &records[0];
        assert_eq!((r.year, r.month, r.day, r.weekday), (2020, 1, 1, 2));
        assert_eq!(r.review_length, 5);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let records = derive_features(vec![review("héllo", 0)]).unwrap();
        assert_eq!(records[0].review_length, 5);
    }

    #[test]
    fn flags_and_votes_normalize() {
        let mut a = review("x", 0);
        a.helpful_vote = Some(9);
        a.verified_purchase = true;
        a.images = vec!["u.jpg".into()];
        let records = derive_features(vec![a]).unwrap();
        let r = &records[0];
        assert_eq!(r.helpful_vote, 9);
        assert_eq!(r.verified_purchase, 1);
        assert_eq!(r.has_images, 1);
    }

    #[test]
    fn out_of_range_timestamp_fails_with_index() {
        let err = derive_features(vec![review("ok", 0), review("bad", i64::MAX)]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedRecord { index: 1, .. }
        ));
    }

    #[test]
    fn conserves_row_count_and_order() {
        let input: Vec<_> = (0..50).map(|i| review(&format!("r{i}"), i * 1_000)).collect();
        let output = derive_features(input.clone()).unwrap();
        assert_eq!(output.len(), input.len());
        for (r, original) in output.iter().zip(&input) {
            assert_eq!(r.text, original.text);
        }
    }
}
