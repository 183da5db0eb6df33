//! Classification evaluation metrics.

/// Fraction of predictions matching the true labels. Returns 0.0 for empty
/// input.
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f32 {
    if y_pred.is_empty() || y_pred.len() != y_true.len() {
        return 0.0;
    }
    let correct = y_pred.iter().zip(y_true).filter(|(p, t)| p == t).count();
    correct as f32 / y_pred.len() as f32
}

/// Confusion matrix with `matrix[actual][predicted]` counts.
pub fn confusion_matrix(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&pred, &actual) in y_pred.iter().zip(y_true) {
        if pred < n_classes && actual < n_classes {
            matrix[actual][pred] += 1;
        }
    }
    matrix
}

/// ROC curve points `(false_positive_rate, true_positive_rate)` swept over
/// every score threshold, from (0, 0) to (1, 1).
pub fn roc_curve(scores: &[f32], labels: &[usize]) -> Vec<(f32, f32)> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return vec![(0.0, 0.0), (1.0, 1.0)];
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = Vec::with_capacity(scores.len() + 2);
    points.push((0.0, 0.0));
    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut i = 0;
    while i < order.len() {
        // Tied scores move as one threshold step.
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if labels[order[i]] == 1 {
                true_positives += 1;
            } else {
                false_positives += 1;
            }
            i += 1;
        }
        points.push((
            false_positives as f32 / negatives as f32,
            true_positives as f32 / positives as f32,
        ));
    }
    points
}

/// Area under the ROC curve by trapezoidal integration. 0.5 means chance.
pub fn roc_auc(scores: &[f32], labels: &[usize]) -> f32 {
    let points = roc_curve(scores, labels);
    points
        .windows(2)
        .map(|pair| {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            (x1 - x0) * (y0 + y1) / 2.0
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn confusion_matrix_places_counts() {
        let matrix = confusion_matrix(&[0, 1, 1, 2], &[0, 1, 2, 2], 3);
        assert_eq!(matrix[0][0], 1);
        assert_eq!(matrix[1][1], 1);
        assert_eq!(matrix[2][1], 1);
        assert_eq!(matrix[2][2], 1);
        assert_eq!(matrix[0][2], 0);
    }

    #[test]
    fn perfect_separation_has_unit_auc() {
        let scores = [0.9, 0.8, 0.2, 0.1];
        let labels = [1, 1, 0, 0];
        assert!((roc_auc(&scores, &labels) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reversed_separation_has_zero_auc() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [1, 1, 0, 0];
        assert!(roc_auc(&scores, &labels).abs() < 1e-6);
    }

    #[test]
    fn random_interleaving_is_half() {
        let scores = [0.4, 0.3, 0.2, 0.1];
        let labels = [1, 0, 1, 0];
        let auc = roc_auc(&scores, &labels);
        assert!((auc - 0.5).abs() < 0.3);
    }

    #[test]
    fn curve_starts_at_origin_and_ends_at_one() {
        let scores = [0.9, 0.1];
        let labels = [1, 0];
        let points = roc_curve(&scores, &labels);
        assert_eq!(points.first(), Some(&(0.0, 0.0)));
        assert_eq!(points.last(), Some(&(1.0, 1.0)));
    }
}
