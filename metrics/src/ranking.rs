use crate::is_positive;

/// Label-ranking average precision over rows.
///
/// For each relevant label of a row, the fraction of labels ranked at or
/// above it that are also relevant. Ties rank pessimistically. Rows with no
/// relevant label, or with every label relevant, score 1.
pub fn label_ranking_average_precision(predictions: &[Vec<f32>], truth: &[Vec<f32>]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }

    let total: f64 = predictions
        .iter()
        .zip(truth.iter())
        .map(|(scores, labels)| row_precision(scores, labels))
        .sum();

    total / predictions.len() as f64
}

fn row_precision(scores: &[f32], labels: &[f32]) -> f64 {
    let relevant: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &value)| is_positive(value))
        .map(|(idx, _)| idx)
        .collect();

    if relevant.is_empty() || relevant.len() == labels.len() {
        return 1.0;
    }

    let mut sum = 0.0;
    for &label in &relevant {
        let threshold = scores[label];
        let rank = scores.iter().filter(|&&s| s >= threshold).count();
        let relevant_rank = relevant
            .iter()
            .filter(|&&other| scores[other] >= threshold)
            .count();
        sum += relevant_rank as f64 / rank as f64;
    }

    sum / relevant.len() as f64
}

/// Root mean squared error between raw scores and binary targets.
pub fn rmse(predictions: &[Vec<f32>], truth: &[Vec<f32>]) -> f64 {
    let mut squared = 0.0;
    let mut count = 0usize;

    for (scores, labels) in predictions.iter().zip(truth.iter()) {
        for (&p, &t) in scores.iter().zip(labels.iter()) {
            let diff = p as f64 - t as f64;
            squared += diff * diff;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }
    (squared / count as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrap_perfect_ranking() {
        let preds = vec![vec![0.9, 0.1, 0.8], vec![0.1, 0.7, 0.2]];
        let truth = vec![vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]];
        assert!((label_ranking_average_precision(&preds, &truth) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lrap_known_value() {
        // Relevant label ranked second: precision 1/2
        let preds = vec![vec![0.9, 0.5, 0.1]];
        let truth = vec![vec![0.0, 1.0, 0.0]];
        assert!((label_ranking_average_precision(&preds, &truth) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lrap_ties_rank_pessimistically() {
        let preds = vec![vec![0.5, 0.5, 0.5]];
        let truth = vec![vec![1.0, 0.0, 0.0]];
        assert!((label_ranking_average_precision(&preds, &truth) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_lrap_degenerate_rows_score_one() {
        let preds = vec![vec![0.1, 0.9], vec![0.3, 0.2]];
        let truth = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        assert_eq!(label_ranking_average_precision(&preds, &truth), 1.0);
    }

    #[test]
    fn test_rmse() {
        let preds = vec![vec![1.0, 0.0], vec![0.5, 0.5]];
        let truth = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        // (0 + 0 + 0.25 + 0.25) / 4 = 0.125
        assert!((rmse(&preds, &truth) - 0.125f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rmse_exact_match() {
        let rows = vec![vec![1.0, 0.0, 1.0]];
        assert_eq!(rmse(&rows, &rows), 0.0);
    }
}
