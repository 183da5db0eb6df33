//! End-to-end study run: load the review corpus, derive features, score with
//! a neural backend, persist the scored table, and fit the study's models.
//!
//! Run with: cargo run --example score_reviews --release

use review_sentiment::analysis::{
    feature_matrix, fixed_effects, label_three_way, metrics, random_effects, train_test_split,
    GradientBoostingClassifier, LogisticRegression, PanelData, StandardScaler,
};
use review_sentiment::dataset::{derive_features, ReviewDatasetLoader};
use review_sentiment::error::Result;
use review_sentiment::interchange::{attach_scores, read_jsonl, write_csv, write_jsonl};
use review_sentiment::report::{roc_chart, score_histogram};
use review_sentiment::sentiment::SentimentPipelineBuilder;

const DATASET: &str = "McAuley-Lab/Amazon-Reviews-2023";
const CONFIG: &str = "raw_review_All_Beauty";
const MAX_ROWS: usize = 20_000;

fn main() -> Result<()> {
    println!("Loading {CONFIG} from {DATASET}...");
    let reviews = ReviewDatasetLoader::new(DATASET, CONFIG)
        .with_max_rows(MAX_ROWS)
        .load()?;
    println!("Loaded {} reviews.", reviews.len());

    let records = derive_features(reviews)?;

    println!("Building scoring pipeline...");
    let pipeline = SentimentPipelineBuilder::distilbert()
        .batch_size(20)
        .max_concurrency(8)
        .build()?;

    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let output = pipeline.score(&texts)?;
    println!(
        "Scored {} reviews in {:.1}s ({:.0} reviews/s).",
        output.stats.items_processed,
        output.stats.total_time.as_secs_f64(),
        output.stats.items_per_second()
    );

    let table = attach_scores(records, pipeline.backend_name(), &output.scores)?;
    write_csv("sentiment_analysis_results.csv", &table)?;
    write_jsonl("sentiment_analysis_results.jsonl", &table)?;

    // The modeling stage reads the persisted artifact, not pipeline memory.
    let table = read_jsonl("sentiment_analysis_results.jsonl")?;
    let score_tag = pipeline.backend_name();
    let scores: Vec<f32> = table
        .iter()
        .filter_map(|row| row.score(score_tag))
        .collect();
    score_histogram(
        "sentiment_score_distribution.svg",
        "Sentiment Score Distribution",
        &scores,
        50,
    )?;

    // Three-way classification of sentiment from review metadata.
    let labels: Vec<usize> = scores.iter().map(|&s| label_three_way(s)).collect();
    let mut scaler = StandardScaler::new();
    let x = scaler.fit_transform(&feature_matrix(&table))?;
    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &labels, 0.2, 42)?;

    let mut model = LogisticRegression::new()
        .with_learning_rate(0.3)
        .with_max_iter(2000);
    model.fit(&x_train, &y_train)?;

    let predictions = model.predict(&x_test);
    println!(
        "Logistic regression accuracy: {:.4}",
        metrics::accuracy(&predictions, &y_test)
    );
    let confusion = metrics::confusion_matrix(&predictions, &y_test, 3);
    println!("Confusion matrix (rows = actual): {confusion:?}");

    // One-vs-rest ROC for the positive class.
    let probabilities = model.predict_proba(&x_test);
    let positive_scores: Vec<f32> = probabilities.iter().map(|p| p[2]).collect();
    let positive_labels: Vec<usize> = y_test.iter().map(|&y| usize::from(y == 2)).collect();
    let auc = metrics::roc_auc(&positive_scores, &positive_labels);
    println!("Positive-class AUC: {auc:.4}");
    roc_chart(
        "roc_curve.svg",
        "ROC Curve",
        &[(
            format!("positive vs rest (AUC = {auc:.4})"),
            metrics::roc_curve(&positive_scores, &positive_labels),
        )],
    )?;

    // Gradient-boosted stumps on the simpler binary split at zero.
    let binary_labels: Vec<usize> = scores
        .iter()
        .map(|&s| review_sentiment::analysis::label_binary(s))
        .collect();
    let (bx_train, bx_test, by_train, by_test) =
        train_test_split(&x, &binary_labels, 0.2, 42)?;
    let mut booster = GradientBoostingClassifier::new()
        .with_n_estimators(100)
        .with_learning_rate(0.1);
    booster.fit(&bx_train, &by_train)?;
    let boosted_probabilities = booster.predict_proba(&bx_test);
    println!(
        "Gradient boosting accuracy: {:.4}, AUC: {:.4}",
        metrics::accuracy(&booster.predict(&bx_test), &by_test),
        metrics::roc_auc(&boosted_probabilities, &by_test)
    );

    // Panel regressions of the raw score on metadata, indexed by reviewer.
    let entities: Vec<String> = table.iter().map(|r| r.record.user_id.clone()).collect();
    let panel_x: Vec<Vec<f64>> = table
        .iter()
        .map(|r| {
            vec![
                r.record.rating as f64,
                (r.record.review_length as f64).ln_1p(),
                r.record.helpful_vote as f64,
                r.record.verified_purchase as f64,
                r.record.has_images as f64,
            ]
        })
        .collect();
    let panel_y: Vec<f64> = table
        .iter()
        .filter_map(|r| r.score(score_tag).map(f64::from))
        .collect();
    let names = [
        "rating",
        "log_review_length",
        "helpful_vote",
        "verified_purchase",
        "has_images",
    ]
    .map(String::from)
    .to_vec();

    let panel = PanelData::new(entities, panel_x, panel_y, names)?;
    match fixed_effects(&panel) {
        Ok(summary) => println!("\n{summary}"),
        Err(e) => println!("\nFixed effects not estimable on this sample: {e}"),
    }
    println!("\n{}", random_effects(&panel)?);

    Ok(())
}
