use std::collections::{HashMap, HashSet};

use crate::error::Result;

use super::model::PolarityModel;

/// Tokens that flip the sign of the next sentiment word within the window.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "cannot", "cant", "dont", "doesnt", "didnt", "wont",
    "wouldnt", "couldnt", "shouldnt", "isnt", "wasnt", "arent", "werent", "hardly", "barely",
];

/// Degree modifiers and the factor they apply to the next sentiment word.
const MODIFIERS: &[(&str, f32)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("absolutely", 1.5),
    ("totally", 1.4),
    ("so", 1.2),
    ("super", 1.4),
    ("quite", 1.1),
    ("slightly", 0.7),
    ("somewhat", 0.8),
    ("kinda", 0.8),
    ("barely", 0.6),
    ("almost", 0.8),
];

/// Word valences, centered on product-review vocabulary. Scale roughly -4..4,
/// matching common sentiment lexica.
const VALENCES: &[(&str, f32)] = &[
    ("amazing", 3.2),
    ("awesome", 3.1),
    ("excellent", 3.2),
    ("fantastic", 3.3),
    ("great", 2.8),
    ("good", 1.9),
    ("love", 3.2),
    ("loved", 3.0),
    ("loves", 3.0),
    ("like", 1.5),
    ("liked", 1.5),
    ("perfect", 3.0),
    ("best", 3.2),
    ("better", 1.8),
    ("nice", 1.8),
    ("happy", 2.2),
    ("pleased", 2.0),
    ("satisfied", 2.0),
    ("recommend", 2.2),
    ("recommended", 2.2),
    ("works", 1.2),
    ("worked", 1.2),
    ("quality", 1.4),
    ("sturdy", 1.6),
    ("durable", 1.6),
    ("comfortable", 1.8),
    ("beautiful", 2.6),
    ("gorgeous", 2.8),
    ("smooth", 1.4),
    ("fast", 1.2),
    ("easy", 1.4),
    ("helpful", 1.8),
    ("worth", 1.6),
    ("favorite", 2.4),
    ("impressed", 2.2),
    ("wonderful", 3.0),
    ("delighted", 2.8),
    ("gentle", 1.2),
    ("soft", 1.2),
    ("fresh", 1.3),
    ("bad", -2.1),
    ("terrible", -3.1),
    ("horrible", -3.2),
    ("awful", -3.1),
    ("worst", -3.3),
    ("worse", -1.9),
    ("hate", -3.0),
    ("hated", -2.9),
    ("poor", -2.1),
    ("cheap", -1.4),
    ("flimsy", -1.9),
    ("broke", -2.4),
    ("broken", -2.4),
    ("breaks", -2.2),
    ("defective", -2.6),
    ("faulty", -2.4),
    ("useless", -2.7),
    ("waste", -2.5),
    ("wasted", -2.4),
    ("disappointed", -2.4),
    ("disappointing", -2.4),
    ("disappointment", -2.4),
    ("refund", -1.6),
    ("return", -1.0),
    ("returned", -1.4),
    ("returning", -1.4),
    ("scam", -3.0),
    ("fake", -2.2),
    ("smell", -0.8),
    ("smells", -0.8),
    ("stink", -2.0),
    ("stinks", -2.0),
    ("leaked", -1.8),
    ("leaking", -1.8),
    ("damaged", -2.2),
    ("slow", -1.2),
    ("hard", -0.8),
    ("difficult", -1.4),
    ("uncomfortable", -1.8),
    ("rude", -2.2),
    ("overpriced", -1.8),
    ("expensive", -0.9),
    ("sad", -1.8),
    ("angry", -2.2),
    ("annoying", -1.9),
    ("painful", -2.2),
    ("irritating", -1.9),
    ("itchy", -1.4),
    ("dry", -0.8),
    ("greasy", -1.2),
    ("sticky", -1.0),
];

/// Window (in sentiment-bearing tokens) within which a negation stays active.
const NEGATION_WINDOW: usize = 3;

/// Damping applied when a negation flips a valence.
const NEGATION_DAMPING: f32 = 0.8;

/// Normalization constant for the compound score.
const NORMALIZATION_ALPHA: f32 = 15.0;

/// Lexicon-based polarity scorer.
///
/// Sums word valences with negation flipping and degree modifiers, then
/// normalizes the total to a compound score in `[-1, 1]` via
/// `x / sqrt(x^2 + alpha)`. Deterministic, allocation-light, and cheap enough
/// that the pipeline scores records one at a time without a worker pool.
///
/// # Examples
///
/// ```rust
/// use review_sentiment::sentiment::LexiconScorer;
///
/// let scorer = LexiconScorer::new();
/// assert!(scorer.compound("great product") > 0.0);
/// assert!(scorer.compound("terrible, broke immediately") < 0.0);
/// ```
pub struct LexiconScorer {
    valences: HashMap<&'static str, f32>,
    negations: HashSet<&'static str>,
    modifiers: HashMap<&'static str, f32>,
}

impl LexiconScorer {
    /// Build the scorer with the built-in review lexicon.
    pub fn new() -> Self {
        Self {
            valences: VALENCES.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
            modifiers: MODIFIERS.iter().copied().collect(),
        }
    }

    /// Compound polarity of `text`, in `[-1, 1]`.
    pub fn compound(&self, text: &str) -> f32 {
        let mut total = 0.0f32;
        let mut modifier = 1.0f32;
        let mut negation_age: Option<usize> = None;

        for token in tokens(text) {
            if self.negations.contains(token.as_str()) {
                negation_age = Some(0);
                continue;
            }
            if let Some(&factor) = self.modifiers.get(token.as_str()) {
                modifier *= factor;
                continue;
            }
            if let Some(&valence) = self.valences.get(token.as_str()) {
                let mut score = valence * modifier;
                if negation_age.is_some_and(|age| age < NEGATION_WINDOW) {
                    score = -score * NEGATION_DAMPING;
                    negation_age = None;
                }
                total += score;
                modifier = 1.0;
            }
            if let Some(age) = negation_age.as_mut() {
                *age += 1;
                if *age >= NEGATION_WINDOW {
                    negation_age = None;
                }
            }
        }

        normalize(total)
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityModel for LexiconScorer {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn score_batch(&self, texts: &[&str]) -> Result<Vec<f32>> {
        Ok(texts.iter().map(|text| self.compound(text)).collect())
    }

    fn prefers_sequential(&self) -> bool {
        true
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\'', "").to_lowercase())
}

fn normalize(total: f32) -> f32 {
    if total == 0.0 {
        return 0.0;
    }
    (total / (total * total + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directionally_correct() {
        let scorer = LexiconScorer::new();
        assert!(scorer.compound("great product") > 0.0);
        assert!(scorer.compound("terrible, broke immediately") < 0.0);
    }

    #[test]
    fn neutral_text_is_zero() {
        let scorer = LexiconScorer::new();
        assert_eq!(scorer.compound("the box arrived on tuesday"), 0.0);
        assert_eq!(scorer.compound(""), 0.0);
    }

    #[test]
    fn negation_flips_polarity() {
        let scorer = LexiconScorer::new();
        assert!(scorer.compound("not good at all") < 0.0);
        assert!(scorer.compound("not bad for the price") > 0.0);
    }

    #[test]
    fn negation_window_expires() {
        let scorer = LexiconScorer::new();
        // Four plain tokens between the negation and the sentiment word.
        let distant = scorer.compound("not the one that we saw but great");
        assert!(distant > 0.0);
    }

    #[test]
    fn modifiers_amplify() {
        let scorer = LexiconScorer::new();
        let plain = scorer.compound("good product");
        let boosted = scorer.compound("extremely good product");
        assert!(boosted > plain);
    }

    #[test]
    fn bounded_by_one() {
        let scorer = LexiconScorer::new();
        let gushing = "amazing awesome excellent fantastic perfect best wonderful love";
        let score = scorer.compound(gushing);
        assert!(score > 0.9 && score <= 1.0);
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let scorer = LexiconScorer::new();
        assert_eq!(
            scorer.compound("GREAT product!!!"),
            scorer.compound("great product")
        );
    }
}
