//! Round-trip tests for the persisted scored table: both encodings must
//! reproduce schema, row order, and score values.

use review_sentiment::dataset::{derive_features, ReviewRecord};
use review_sentiment::interchange::{
    add_scores, attach_scores, read_csv, read_jsonl, score_column, write_csv, write_jsonl,
    ScoredRecord,
};

fn sample_table() -> Vec<ScoredRecord> {
    let reviews: Vec<ReviewRecord> = (0..25)
        .map(|i| ReviewRecord {
            rating: (i % 5 + 1) as f32,
            title: format!("title {i}"),
            text: format!("review body {i}, with a comma and \"quotes\""),
            images: if i % 3 == 0 {
                vec![format!("https://img.example/{i}.jpg")]
            } else {
                Vec::new()
            },
            asin: format!("B{i:05}"),
            parent_asin: "B00000".to_string(),
            user_id: format!("U{}", i % 4),
            timestamp: 1_500_000_000_000 + i as i64 * 86_400_000,
            helpful_vote: (i % 2 == 0).then_some(i as u32),
            verified_purchase: i % 2 == 1,
        })
        .collect();

    let records = derive_features(reviews).unwrap();
    let scores: Vec<f32> = (0..25).map(|i| (i as f32 / 12.5) - 1.0).collect();
    let mut table = attach_scores(records, "distilbert", &scores).unwrap();
    let lexicon: Vec<f32> = (0..25).map(|i| 0.017_f32 * i as f32).collect();
    add_scores(&mut table, "lexicon", &lexicon).unwrap();
    table
}

fn assert_tables_match(read: &[ScoredRecord], written: &[ScoredRecord]) {
    assert_eq!(read.len(), written.len());
    for (a, b) in read.iter().zip(written) {
        assert_eq!(a.record, b.record);
        assert_eq!(
            a.scores.keys().collect::<Vec<_>>(),
            b.scores.keys().collect::<Vec<_>>()
        );
        for (column, &score) in &b.scores {
            let restored = a.scores[column];
            assert!(
                (restored - score).abs() < 1e-5,
                "{column}: {restored} != {score}"
            );
        }
    }
}

#[test]
fn csv_round_trips_schema_order_and_scores() {
    let table = sample_table();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scored.csv");

    write_csv(&path, &table).unwrap();
    let restored = read_csv(&path).unwrap();

    assert_tables_match(&restored, &table);
}

#[test]
fn jsonl_round_trips_schema_order_and_scores() {
    let table = sample_table();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scored.jsonl");

    write_jsonl(&path, &table).unwrap();
    let restored = read_jsonl(&path).unwrap();

    assert_tables_match(&restored, &table);
}

#[test]
fn encodings_agree_with_each_other() {
    let table = sample_table();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("scored.csv");
    let jsonl_path = dir.path().join("scored.jsonl");

    write_csv(&csv_path, &table).unwrap();
    write_jsonl(&jsonl_path, &table).unwrap();

    let from_csv = read_csv(&csv_path).unwrap();
    let from_jsonl = read_jsonl(&jsonl_path).unwrap();
    assert_tables_match(&from_csv, &from_jsonl);
}

#[test]
fn score_columns_stay_tagged_per_backend() {
    let table = sample_table();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scored.jsonl");
    write_jsonl(&path, &table).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let first_line = raw.lines().next().unwrap();
    assert!(first_line.contains(&score_column("distilbert")));
    assert!(first_line.contains(&score_column("lexicon")));

    let restored = read_jsonl(&path).unwrap();
    assert_eq!(
        restored[0].score("distilbert"),
        table[0].score("distilbert")
    );
    assert_eq!(restored[0].score("modernbert"), None);
}

#[test]
fn row_order_is_loader_order() {
    let table = sample_table();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scored.csv");
    write_csv(&path, &table).unwrap();
    let restored = read_csv(&path).unwrap();

    for (i, row) in restored.iter().enumerate() {
        assert_eq!(row.record.title, format!("title {i}"));
    }
}
