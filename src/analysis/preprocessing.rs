//! Feature scaling and data splitting.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

/// Standardizes features to zero mean and unit variance, column-wise.
///
/// # Example
///
/// ```
/// use review_sentiment::analysis::StandardScaler;
///
/// let x = vec![vec![1.0, 10.0], vec![3.0, 30.0]];
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&x).unwrap();
/// assert!((scaled[0][0] + 1.0).abs() < 1e-6);
/// assert!((scaled[1][0] - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    means: Vec<f32>,
    stds: Vec<f32>,
}

impl StandardScaler {
    /// Creates an unfitted scaler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn per-column mean and standard deviation.
    pub fn fit(&mut self, x: &[Vec<f32>]) -> Result<()> {
        let n_features = check_rectangular(x)?;
        let n = x.len() as f32;

        self.means = vec![0.0; n_features];
        for row in x {
            for (mean, &v) in self.means.iter_mut().zip(row) {
                *mean += v;
            }
        }
        for mean in &mut self.means {
            *mean /= n;
        }

        self.stds = vec![0.0; n_features];
        for row in x {
            for ((std, &v), &mean) in self.stds.iter_mut().zip(row).zip(&self.means) {
                *std += (v - mean) * (v - mean);
            }
        }
        for std in &mut self.stds {
            *std = (*std / n).sqrt();
            // Constant columns pass through unscaled rather than dividing by zero.
            if *std == 0.0 {
                *std = 1.0;
            }
        }
        Ok(())
    }

    /// Apply the learned standardization.
    pub fn transform(&self, x: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if self.means.is_empty() {
            return Err(PipelineError::Configuration(
                "scaler is not fitted".to_string(),
            ));
        }
        x.iter()
            .map(|row| {
                if row.len() != self.means.len() {
                    return Err(PipelineError::Configuration(format!(
                        "row has {} features, scaler was fitted on {}",
                        row.len(),
                        self.means.len()
                    )));
                }
                Ok(row
                    .iter()
                    .zip(&self.means)
                    .zip(&self.stds)
                    .map(|((&v, &mean), &std)| (v - mean) / std)
                    .collect())
            })
            .collect()
    }

    /// Fit on `x` and return its standardized copy.
    pub fn fit_transform(&mut self, x: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Split `(x, y)` into shuffled train and test partitions.
///
/// The shuffle is seeded, so a given `(data, test_ratio, seed)` always yields
/// the same split. Returns `(x_train, x_test, y_train, y_test)`.
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    x: &[Vec<f32>],
    y: &[usize],
    test_ratio: f32,
    seed: u64,
) -> Result<(Vec<Vec<f32>>, Vec<Vec<f32>>, Vec<usize>, Vec<usize>)> {
    if x.len() != y.len() {
        return Err(PipelineError::Configuration(format!(
            "{} rows of features for {} labels",
            x.len(),
            y.len()
        )));
    }
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(PipelineError::Configuration(format!(
            "test_ratio {test_ratio} must be in [0, 1)"
        )));
    }

    let mut indices: Vec<usize> = (0..x.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = (x.len() as f32 * test_ratio).round() as usize;
    let (test_idx, train_idx) = indices.split_at(test_len);

    let take_x = |idx: &[usize]| idx.iter().map(|&i| x[i].clone()).collect::<Vec<_>>();
    let take_y = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<_>>();
    Ok((
        take_x(train_idx),
        take_x(test_idx),
        take_y(train_idx),
        take_y(test_idx),
    ))
}

pub(crate) fn check_rectangular(x: &[Vec<f32>]) -> Result<usize> {
    let Some(first) = x.first() else {
        return Err(PipelineError::Configuration(
            "empty design matrix".to_string(),
        ));
    };
    let n_features = first.len();
    if x.iter().any(|row| row.len() != n_features) {
        return Err(PipelineError::Configuration(
            "design matrix rows have unequal lengths".to_string(),
        ));
    }
    Ok(n_features)
}
