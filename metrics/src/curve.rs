use crate::is_positive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("only one class present in ground truth, ROC-AUC is undefined")]
    SingleClass,
    #[error("no positive samples in ground truth, average precision is undefined")]
    NoPositives,
    #[error("score and ground truth lengths differ")]
    LengthMismatch,
}

/// Cumulative true/false positive counts at every distinct score threshold,
/// highest threshold first.
struct Sweep {
    points: Vec<(f64, f64)>,
    positives: f64,
    negatives: f64,
}

impl Sweep {
    fn new(scores: &[f32], truth: &[f32]) -> Result<Self, CurveError> {
        if scores.len() != truth.len() {
            return Err(CurveError::LengthMismatch);
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut points = Vec::new();
        let mut tp = 0.0;
        let mut fp = 0.0;

        for (pos, &idx) in order.iter().enumerate() {
            if is_positive(truth[idx]) {
                tp += 1.0;
            } else {
                fp += 1.0;
            }

            // Tied scores share one threshold
            let next_is_tie = order
                .get(pos + 1)
                .is_some_and(|&next| scores[next] == scores[idx]);
            if !next_is_tie {
                points.push((tp, fp));
            }
        }

        Ok(Self {
            points,
            positives: tp,
            negatives: fp,
        })
    }
}

/// Area under the ROC curve for one label, trapezoidal over distinct thresholds.
pub fn roc_auc(scores: &[f32], truth: &[f32]) -> Result<f64, CurveError> {
    let sweep = Sweep::new(scores, truth)?;
    if sweep.positives == 0.0 || sweep.negatives == 0.0 {
        return Err(CurveError::SingleClass);
    }

    let mut area = 0.0;
    let (mut prev_tpr, mut prev_fpr) = (0.0, 0.0);

    for &(tp, fp) in &sweep.points {
        let tpr = tp / sweep.positives;
        let fpr = fp / sweep.negatives;
        area += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_tpr = tpr;
        prev_fpr = fpr;
    }

    Ok(area)
}

/// Average precision: sum over thresholds of `(R_n - R_{n-1}) * P_n`.
///
/// Step-wise, without interpolation, so it does not overestimate the area
/// the way a trapezoidal PR integral does.
pub fn average_precision(scores: &[f32], truth: &[f32]) -> Result<f64, CurveError> {
    let sweep = Sweep::new(scores, truth)?;
    if sweep.positives == 0.0 {
        return Err(CurveError::NoPositives);
    }

    let mut ap = 0.0;
    let mut prev_recall = 0.0;

    for &(tp, fp) in &sweep.points {
        let recall = tp / sweep.positives;
        let precision = tp / (tp + fp);
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }

    Ok(ap)
}
