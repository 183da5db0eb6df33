//! Offline scoring demo with the lexicon backend - no downloads, no device.
//!
//! Run with: cargo run --example lexicon_scoring

use review_sentiment::error::Result;
use review_sentiment::sentiment::SentimentPipelineBuilder;

fn main() -> Result<()> {
    let pipeline = SentimentPipelineBuilder::lexicon().build()?;

    let reviews = &[
        "This product is amazing!",
        "Terrible experience, would not recommend.",
        "It's okay, nothing special.",
        "Not bad for the price.",
        "Broke immediately, total waste of money.",
    ];

    let output = pipeline.score(reviews)?;

    println!("=== Lexicon Sentiment ===");
    for (text, score) in reviews.iter().zip(&output.scores) {
        println!("{score:+.3}  {text}");
    }
    println!(
        "\nScored {} reviews in {:.2}ms",
        output.stats.items_processed,
        output.stats.total_time.as_secs_f64() * 1000.0
    );

    Ok(())
}
