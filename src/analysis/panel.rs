//! Panel regressions over (entity, time)-indexed observations.
//!
//! The study indexes reviews by reviewer and fits pooled OLS, a fixed-effects
//! (within) estimator, and a random-effects (quasi-demeaned) estimator of the
//! sentiment score on the metadata columns.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// Observations grouped by entity, in row order.
#[derive(Debug, Clone)]
pub struct PanelData {
    /// Entity identifier per observation (e.g. reviewer id).
    pub entities: Vec<String>,
    /// Regressor rows, one per observation.
    pub x: Vec<Vec<f64>>,
    /// Outcome per observation.
    pub y: Vec<f64>,
    /// Regressor names, for reporting.
    pub names: Vec<String>,
}

impl PanelData {
    /// Build a panel, validating shapes.
    pub fn new(
        entities: Vec<String>,
        x: Vec<Vec<f64>>,
        y: Vec<f64>,
        names: Vec<String>,
    ) -> Result<Self> {
        if entities.len() != x.len() || x.len() != y.len() {
            return Err(PipelineError::Configuration(format!(
                "panel shapes disagree: {} entities, {} rows, {} outcomes",
                entities.len(),
                x.len(),
                y.len()
            )));
        }
        let Some(width) = x.first().map(Vec::len) else {
            return Err(PipelineError::Configuration("empty panel".to_string()));
        };
        if x.iter().any(|row| row.len() != width) || names.len() != width {
            return Err(PipelineError::Configuration(
                "panel rows and names have unequal widths".to_string(),
            ));
        }
        Ok(Self {
            entities,
            x,
            y,
            names,
        })
    }

    fn groups(&self) -> HashMap<&str, Vec<usize>> {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, entity) in self.entities.iter().enumerate() {
            groups.entry(entity.as_str()).or_default().push(i);
        }
        groups
    }
}

/// Fitted regression: coefficient per regressor, with fit diagnostics.
#[derive(Debug, Clone)]
pub struct RegressionSummary {
    /// Estimator label.
    pub estimator: &'static str,
    /// Regressor names aligned with `coefficients`.
    pub names: Vec<String>,
    /// Estimated coefficients.
    pub coefficients: Vec<f64>,
    /// Intercept, when the estimator fits one.
    pub intercept: Option<f64>,
    /// Coefficient of determination on the transformed data.
    pub r_squared: f64,
    /// Number of observations.
    pub n_obs: usize,
}

impl std::fmt::Display for RegressionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} (n = {})", self.estimator, self.n_obs)?;
        if let Some(intercept) = self.intercept {
            writeln!(f, "  const{:>22.6}", intercept)?;
        }
        for (name, coefficient) in self.names.iter().zip(&self.coefficients) {
            writeln!(f, "  {name:<12}{coefficient:>15.6}")?;
        }
        write!(f, "  R-squared: {:.4}", self.r_squared)
    }
}

/// Pooled OLS with intercept: ignores the panel structure entirely.
pub fn pooled_ols(panel: &PanelData) -> Result<RegressionSummary> {
    let (coefficients, intercept, r_squared) = ols(&panel.x, &panel.y, true)?;
    Ok(RegressionSummary {
        estimator: "PooledOLS",
        names: panel.names.clone(),
        coefficients,
        intercept,
        r_squared,
        n_obs: panel.y.len(),
    })
}

/// Fixed-effects (within) estimator: demeans every entity's observations,
/// absorbing entity-level intercepts, then runs OLS without a constant.
pub fn fixed_effects(panel: &PanelData) -> Result<RegressionSummary> {
    let (x, y) = demean(panel, 1.0);
    let (coefficients, intercept, r_squared) = ols(&x, &y, false)?;
    Ok(RegressionSummary {
        estimator: "PanelOLS (entity effects)",
        names: panel.names.clone(),
        coefficients,
        intercept,
        r_squared,
        n_obs: panel.y.len(),
    })
}

/// Random-effects estimator via quasi-demeaning.
///
/// `theta` is derived from the classic variance-components decomposition:
/// within-entity residual variance against between-entity variance, averaged
/// over the entities' group sizes.
pub fn random_effects(panel: &PanelData) -> Result<RegressionSummary> {
    let theta = estimate_theta(panel)?;
    let (x, y) = demean(panel, theta);
    let (coefficients, intercept, r_squared) = ols(&x, &y, true)?;
    Ok(RegressionSummary {
        estimator: "RandomEffects",
        names: panel.names.clone(),
        coefficients,
        intercept,
        r_squared,
        n_obs: panel.y.len(),
    })
}

/// Subtract `theta` times the entity means from every observation.
/// `theta = 1` is the within transform; `theta = 0` leaves data pooled.
fn demean(panel: &PanelData, theta: f64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let width = panel.names.len();
    let mut x = panel.x.clone();
    let mut y = panel.y.clone();

    for indices in panel.groups().values() {
        let count = indices.len() as f64;
        let mut x_means = vec![0.0f64; width];
        let mut y_mean = 0.0f64;
        for &i in indices {
            y_mean += panel.y[i];
            for (mean, &v) in x_means.iter_mut().zip(&panel.x[i]) {
                *mean += v;
            }
        }
        y_mean /= count;
        for mean in &mut x_means {
            *mean /= count;
        }
        for &i in indices {
            y[i] -= theta * y_mean;
            for (v, &mean) in x[i].iter_mut().zip(&x_means) {
                *v -= theta * mean;
            }
        }
    }
    (x, y)
}

/// Swamy-Arora style theta from within and between variance estimates,
/// using the average group size. Degenerate panels (every entity a single
/// observation, or no between variance) fall back to pooled behavior.
fn estimate_theta(panel: &PanelData) -> Result<f64> {
    let groups = panel.groups();
    let avg_size = panel.y.len() as f64 / groups.len() as f64;
    if avg_size <= 1.0 {
        return Ok(0.0);
    }

    let (x_within, y_within) = demean(panel, 1.0);
    let (within_coef, _, _) = ols(&x_within, &y_within, false)?;
    let sigma_e2 = {
        let mut sse = 0.0;
        for (row, &outcome) in x_within.iter().zip(&y_within) {
            let fitted: f64 = row.iter().zip(&within_coef).map(|(&v, &c)| v * c).sum();
            sse += (outcome - fitted) * (outcome - fitted);
        }
        sse / y_within.len() as f64
    };

    let grand_mean = panel.y.iter().sum::<f64>() / panel.y.len() as f64;
    let between_var = groups
        .values()
        .map(|indices| {
            let mean = indices.iter().map(|&i| panel.y[i]).sum::<f64>() / indices.len() as f64;
            (mean - grand_mean) * (mean - grand_mean)
        })
        .sum::<f64>()
        / groups.len() as f64;

    let sigma_u2 = (between_var - sigma_e2 / avg_size).max(0.0);
    if sigma_u2 == 0.0 {
        return Ok(0.0);
    }
    Ok(1.0 - (sigma_e2 / (avg_size * sigma_u2 + sigma_e2)).sqrt())
}

/// OLS by normal equations with a Gaussian-elimination solve.
/// Returns `(coefficients, intercept, r_squared)`.
fn ols(x: &[Vec<f64>], y: &[f64], with_intercept: bool) -> Result<(Vec<f64>, Option<f64>, f64)> {
    let n = x.len();
    if n == 0 || n != y.len() {
        return Err(PipelineError::Configuration(
            "regression needs matching, non-empty x and y".to_string(),
        ));
    }
    let width = x[0].len();
    let cols = width + usize::from(with_intercept);
    if n < cols {
        return Err(PipelineError::Configuration(format!(
            "regression is underdetermined: {n} observations for {cols} parameters"
        )));
    }

    // Build X'X and X'y with an optional leading constant column.
    let design_cell = |row: usize, col: usize| -> f64 {
        if with_intercept {
            if col == 0 {
                1.0
            } else {
                x[row][col - 1]
            }
        } else {
            x[row][col]
        }
    };
    let mut xtx = vec![vec![0.0f64; cols]; cols];
    let mut xty = vec![0.0f64; cols];
    for row in 0..n {
        for a in 0..cols {
            let va = design_cell(row, a);
            xty[a] += va * y[row];
            for b in a..cols {
                xtx[a][b] += va * design_cell(row, b);
            }
        }
    }
    for a in 0..cols {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
    }

    let beta = solve(xtx, xty)?;

    let mut sse = 0.0;
    let mut sst = 0.0;
    let y_mean = y.iter().sum::<f64>() / n as f64;
    for row in 0..n {
        let fitted: f64 = (0..cols).map(|c| design_cell(row, c) * beta[c]).sum();
        sse += (y[row] - fitted) * (y[row] - fitted);
        sst += (y[row] - y_mean) * (y[row] - y_mean);
    }
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 0.0 };

    if with_intercept {
        Ok((beta[1..].to_vec(), Some(beta[0]), r_squared))
    } else {
        Ok((beta, None, r_squared))
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for pivot in 0..n {
        let max_row = (pivot..n)
            .max_by(|&r, &s| a[r][pivot].abs().total_cmp(&a[s][pivot].abs()))
            .unwrap_or(pivot);
        if a[max_row][pivot].abs() < 1e-12 {
            return Err(PipelineError::Configuration(
                "regression design matrix is singular (collinear or constant columns)".to_string(),
            ));
        }
        a.swap(pivot, max_row);
        b.swap(pivot, max_row);

        for row in pivot + 1..n {
            let factor = a[row][pivot] / a[pivot][pivot];
            for col in pivot..n {
                a[row][col] -= factor * a[pivot][col];
            }
            b[row] -= factor * b[pivot];
        }
    }

    let mut solution = vec![0.0f64; n];
    for pivot in (0..n).rev() {
        let tail: f64 = (pivot + 1..n).map(|c| a[pivot][c] * solution[c]).sum();
        solution[pivot] = (b[pivot] - tail) / a[pivot][pivot];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with_known_slope() -> PanelData {
        // y = 2x + entity offset; the within estimator must recover slope 2.
        let mut entities = Vec::new();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (entity, offset) in [("a", 10.0), ("b", -5.0), ("c", 0.0)] {
            for t in 0..4 {
                entities.push(entity.to_string());
                let v = t as f64;
                x.push(vec![v]);
                y.push(2.0 * v + offset);
            }
        }
        PanelData::new(entities, x, y, vec!["x".to_string()]).unwrap()
    }

    #[test]
    fn within_transform_absorbs_entity_offsets() {
        let panel = panel_with_known_slope();
        let summary = fixed_effects(&panel).unwrap();
        assert!((summary.coefficients[0] - 2.0).abs() < 1e-6);
        assert!(summary.r_squared > 0.999);
    }

    #[test]
    fn pooled_ols_recovers_exact_line() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 1.0).collect();
        let entities = vec!["e".to_string(); 10];
        let panel = PanelData::new(entities, x, y, vec!["x".to_string()]).unwrap();

        let summary = pooled_ols(&panel).unwrap();
        assert!((summary.coefficients[0] - 3.0).abs() < 1e-9);
        assert!((summary.intercept.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn random_effects_between_pooled_and_within() {
        let panel = panel_with_known_slope();
        let summary = random_effects(&panel).unwrap();
        // With strong entity offsets theta is near 1 and the slope near 2.
        assert!((summary.coefficients[0] - 2.0).abs() < 0.2);
    }

    #[test]
    fn singular_design_is_reported() {
        let x = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        let y = vec![1.0, 2.0, 3.0];
        let entities = vec!["e".to_string(); 3];
        let panel = PanelData::new(
            entities,
            x,
            y,
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap();
        assert!(pooled_ols(&panel).is_err());
    }

    #[test]
    fn demean_zeroes_entity_means() {
        let panel = panel_with_known_slope();
        let (x, y) = demean(&panel, 1.0);
        // Per-entity sums of the transformed data are zero.
        for entity in ["a", "b", "c"] {
            let sum_y: f64 = panel
                .entities
                .iter()
                .zip(&y)
                .filter(|(e, _)| e.as_str() == entity)
                .map(|(_, &v)| v)
                .sum();
            assert!(sum_y.abs() < 1e-9);
            let sum_x: f64 = panel
                .entities
                .iter()
                .zip(&x)
                .filter(|(e, _)| e.as_str() == entity)
                .map(|(_, row)| row[0])
                .sum();
            assert!(sum_x.abs() < 1e-9);
        }
    }
}
