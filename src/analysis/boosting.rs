//! Gradient-boosted decision stumps for binary classification.

use crate::error::{PipelineError, Result};

use super::preprocessing::check_rectangular;

/// Candidate split thresholds evaluated per feature.
const THRESHOLD_CANDIDATES: usize = 16;

/// One depth-1 regression tree on the pseudo-residuals.
#[derive(Debug, Clone)]
struct Stump {
    feature: usize,
    threshold: f32,
    left_value: f32,
    right_value: f32,
}

impl Stump {
    fn predict(&self, row: &[f32]) -> f32 {
        if row[self.feature] <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Binary classifier boosting depth-1 trees on the logistic loss.
///
/// Each round fits a stump to the current pseudo-residuals
/// (`label - sigmoid(score)`) and adds it with a shrinkage factor.
///
/// # Example
///
/// ```
/// use review_sentiment::analysis::GradientBoostingClassifier;
///
/// let x: Vec<Vec<f32>> = (0..20).map(|i| vec![i as f32]).collect();
/// let y: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
///
/// let mut model = GradientBoostingClassifier::new()
///     .with_n_estimators(50)
///     .with_learning_rate(0.2);
/// model.fit(&x, &y).unwrap();
/// assert_eq!(model.predict(&x)[0], 0);
/// assert_eq!(model.predict(&x)[19], 1);
/// ```
#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
    stumps: Vec<Stump>,
    base_score: f32,
    learning_rate: f32,
    n_estimators: usize,
}

impl GradientBoostingClassifier {
    /// Creates a classifier with default parameters.
    pub fn new() -> Self {
        Self {
            stumps: Vec::new(),
            base_score: 0.0,
            learning_rate: 0.1,
            n_estimators: 100,
        }
    }

    /// Sets the shrinkage factor applied to each stump.
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the number of boosting rounds.
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Whether `fit` has run.
    pub fn is_fitted(&self) -> bool {
        !self.stumps.is_empty()
    }

    /// Fit to `(x, y)` with binary labels.
    pub fn fit(&mut self, x: &[Vec<f32>], y: &[usize]) -> Result<()> {
        let n_features = check_rectangular(x)?;
        if x.len() != y.len() {
            return Err(PipelineError::Configuration(format!(
                "{} rows of features for {} labels",
                x.len(),
                y.len()
            )));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(PipelineError::Configuration(
                "labels must be 0 or 1".to_string(),
            ));
        }

        let n = x.len() as f32;
        let positive_rate = (y.iter().sum::<usize>() as f32 / n).clamp(1e-4, 1.0 - 1e-4);
        self.base_score = (positive_rate / (1.0 - positive_rate)).ln();
        self.stumps.clear();

        let mut scores = vec![self.base_score; x.len()];
        for _ in 0..self.n_estimators {
            let residuals: Vec<f32> = scores
                .iter()
                .zip(y)
                .map(|(&score, &label)| label as f32 - sigmoid(score))
                .collect();

            let Some(stump) = best_stump(x, &residuals, n_features) else {
                break;
            };
            for (score, row) in scores.iter_mut().zip(x) {
                *score += self.learning_rate * stump.predict(row);
            }
            self.stumps.push(stump);
        }
        Ok(())
    }

    /// Probability of the positive class per row.
    pub fn predict_proba(&self, x: &[Vec<f32>]) -> Vec<f32> {
        x.iter()
            .map(|row| {
                let score = self.base_score
                    + self
                        .stumps
                        .iter()
                        .map(|stump| self.learning_rate * stump.predict(row))
                        .sum::<f32>();
                sigmoid(score)
            })
            .collect()
    }

    /// Predicted label per row, thresholded at 0.5.
    pub fn predict(&self, x: &[Vec<f32>]) -> Vec<usize> {
        self.predict_proba(x)
            .into_iter()
            .map(|p| usize::from(p >= 0.5))
            .collect()
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Least-squares best stump over quantile threshold candidates.
fn best_stump(x: &[Vec<f32>], residuals: &[f32], n_features: usize) -> Option<Stump> {
    let mut best: Option<(f32, Stump)> = None;

    for feature in 0..n_features {
        let mut values: Vec<f32> = x.iter().map(|row| row[feature]).collect();
        values.sort_by(f32::total_cmp);
        values.dedup();
        if values.len() < 2 {
            continue;
        }

        let step = (values.len() / THRESHOLD_CANDIDATES).max(1);
        for threshold in values.iter().step_by(step) {
            let (mut left_sum, mut left_count) = (0.0f32, 0usize);
            let (mut right_sum, mut right_count) = (0.0f32, 0usize);
            for (row, &residual) in x.iter().zip(residuals) {
                if row[feature] <= *threshold {
                    left_sum += residual;
                    left_count += 1;
                } else {
                    right_sum += residual;
                    right_count += 1;
                }
            }
            if left_count == 0 || right_count == 0 {
                continue;
            }

            let left_value = left_sum / left_count as f32;
            let right_value = right_sum / right_count as f32;
            let mut loss = 0.0f32;
            for (row, &residual) in x.iter().zip(residuals) {
                let fitted = if row[feature] <= *threshold {
                    left_value
                } else {
                    right_value
                };
                loss += (residual - fitted) * (residual - fitted);
            }

            if best.as_ref().is_none_or(|(best_loss, _)| loss < *best_loss) {
                best = Some((
                    loss,
                    Stump {
                        feature,
                        threshold: *threshold,
                        left_value,
                        right_value,
                    },
                ));
            }
        }
    }

    best.map(|(_, stump)| stump)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_a_step_function() {
        let x: Vec<Vec<f32>> = (0..40).map(|i| vec![i as f32, 0.0]).collect();
        let y: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();

        let mut model = GradientBoostingClassifier::new()
            .with_n_estimators(30)
            .with_learning_rate(0.3);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x);
        let correct = predictions.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct >= 38, "only {correct}/40 correct");
    }

    #[test]
    fn probabilities_are_bounded() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![0, 0, 1, 1];
        let mut model = GradientBoostingClassifier::new().with_n_estimators(10);
        model.fit(&x, &y).unwrap();
        for p in model.predict_proba(&x) {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn non_binary_labels_rejected() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![0, 2];
        let mut model = GradientBoostingClassifier::new();
        assert!(model.fit(&x, &y).is_err());
    }
}
