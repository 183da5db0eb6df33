//! Multinomial logistic regression.

use crate::error::{PipelineError, Result};

use super::preprocessing::check_rectangular;

/// Multinomial logistic regression trained with full-batch gradient descent
/// on the softmax cross-entropy loss.
///
/// # Example
///
/// ```
/// use review_sentiment::analysis::LogisticRegression;
///
/// let x = vec![
///     vec![0.0, 0.0],
///     vec![0.0, 1.0],
///     vec![1.0, 0.0],
///     vec![1.0, 1.0],
/// ];
/// let y = vec![0, 0, 0, 1];
///
/// let mut model = LogisticRegression::new()
///     .with_learning_rate(0.5)
///     .with_max_iter(2000);
/// model.fit(&x, &y).unwrap();
/// assert_eq!(model.predict(&x).len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Per-class weight rows (`n_classes` x `n_features`).
    weights: Vec<Vec<f32>>,
    /// Per-class intercepts.
    intercepts: Vec<f32>,
    learning_rate: f32,
    max_iter: usize,
    tol: f32,
}

impl LogisticRegression {
    /// Creates a classifier with default parameters.
    pub fn new() -> Self {
        Self {
            weights: Vec::new(),
            intercepts: Vec::new(),
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-5,
        }
    }

    /// Sets the learning rate.
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the maximum number of gradient-descent iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance on the gradient magnitude.
    pub fn with_tolerance(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Whether `fit` has run.
    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Number of classes seen during `fit`.
    pub fn n_classes(&self) -> usize {
        self.weights.len()
    }

    /// Fit to `(x, y)` where labels are `0..n_classes`.
    pub fn fit(&mut self, x: &[Vec<f32>], y: &[usize]) -> Result<()> {
        let n_features = check_rectangular(x)?;
        if x.len() != y.len() {
            return Err(PipelineError::Configuration(format!(
                "{} rows of features for {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        if n_classes < 2 {
            return Err(PipelineError::Configuration(
                "need at least two classes to fit".to_string(),
            ));
        }

        self.weights = vec![vec![0.0; n_features]; n_classes];
        self.intercepts = vec![0.0; n_classes];
        let n = x.len() as f32;

        for _ in 0..self.max_iter {
            let probas = self.predict_proba(x);

            let mut weight_grads = vec![vec![0.0f32; n_features]; n_classes];
            let mut intercept_grads = vec![0.0f32; n_classes];

            for (i, row) in x.iter().enumerate() {
                for class in 0..n_classes {
                    let error = probas[i][class] - f32::from(u8::from(y[i] == class));
                    intercept_grads[class] += error;
                    for (grad, &v) in weight_grads[class].iter_mut().zip(row) {
                        *grad += error * v;
                    }
                }
            }

            let mut max_grad = 0.0f32;
            for class in 0..n_classes {
                intercept_grads[class] /= n;
                max_grad = max_grad.max(intercept_grads[class].abs());
                self.intercepts[class] -= self.learning_rate * intercept_grads[class];
                for (weight, grad) in self.weights[class].iter_mut().zip(&mut weight_grads[class])
                {
                    *grad /= n;
                    max_grad = max_grad.max(grad.abs());
                    *weight -= self.learning_rate * *grad;
                }
            }

            if max_grad < self.tol {
                break;
            }
        }
        Ok(())
    }

    /// Per-class probabilities for each row, softmax-normalized.
    pub fn predict_proba(&self, x: &[Vec<f32>]) -> Vec<Vec<f32>> {
        x.iter()
            .map(|row| {
                let logits: Vec<f32> = self
                    .weights
                    .iter()
                    .zip(&self.intercepts)
                    .map(|(weights, &intercept)| {
                        intercept
                            + weights
                                .iter()
                                .zip(row)
                                .map(|(&weight, &v)| weight * v)
                                .sum::<f32>()
                    })
                    .collect();
                softmax(&logits)
            })
            .collect()
    }

    /// Most probable class per row.
    pub fn predict(&self, x: &[Vec<f32>]) -> Vec<usize> {
        self.predict_proba(x)
            .into_iter()
            .map(|probas| {
                probas
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(class, _)| class)
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&z| (z - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_linearly_separable_data() {
        // One unit-scale feature, classes split at zero.
        let x: Vec<Vec<f32>> = (-10..10).map(|i| vec![i as f32 / 10.0]).collect();
        let y: Vec<usize> = (-10..10).map(|i| usize::from(i >= 0)).collect();

        let mut model = LogisticRegression::new()
            .with_learning_rate(0.5)
            .with_max_iter(3000);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x);
        let correct = predictions
            .iter()
            .zip(&y)
            .filter(|(p, t)| p == t)
            .count();
        assert!(correct >= 18, "only {correct}/20 correct");
    }

    #[test]
    fn three_class_probabilities_sum_to_one() {
        let x = vec![
            vec![-2.0],
            vec![-1.5],
            vec![0.0],
            vec![0.2],
            vec![1.5],
            vec![2.0],
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let mut model = LogisticRegression::new().with_max_iter(500);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_classes(), 3);

        for probas in model.predict_proba(&x) {
            let sum: f32 = probas.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn single_class_rejected() {
        let x = vec![vec![1.0], vec![2.0]];
        let y = vec![0, 0];
        let mut model = LogisticRegression::new();
        assert!(model.fit(&x, &y).is_err());
    }
}
