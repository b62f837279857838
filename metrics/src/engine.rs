use rayon::prelude::*;

use crate::columns::{column_sums, ColumnFilter};
use crate::curve::{average_precision, roc_auc, CurveError};
use crate::ranking::{label_ranking_average_precision, rmse};
use crate::report::MetricReport;

/// Caller broke the input contract. Never downgraded to a soft failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("{predictions} prediction rows but {ground_truth} ground truth rows")]
    RowCount {
        predictions: usize,
        ground_truth: usize,
    },
    #[error("{table} row {row} has width {width}, expected {expected}")]
    Width {
        table: &'static str,
        row: usize,
        width: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DegradedReason {
    #[error("no label has a positive example")]
    NoRetainedLabels,
    #[error("{count} non-finite scores, first at row {row} of label '{label}'")]
    NonFiniteScores {
        count: usize,
        row: usize,
        label: String,
    },
    #[error("label '{label}': {source}")]
    Curve { label: String, source: CurveError },
}

/// Outcome of one metric computation.
///
/// `Degraded` carries the zero fallback: whatever could still be computed,
/// 0 for the rest, per-label vectors zero-filled to the full label width.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Scored(MetricReport),
    Degraded {
        reason: DegradedReason,
        fallback: MetricReport,
    },
}

impl Evaluation {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Evaluation::Degraded { .. })
    }
}

/// Scores `predictions` against `ground_truth`, one column per label.
///
/// Label columns without positives are removed first; macro values average
/// the retained columns only.
pub fn evaluate<S: AsRef<str>>(
    predictions: &[Vec<f32>],
    ground_truth: &[Vec<f32>],
    labels: &[S],
) -> Result<Evaluation, ShapeError> {
    check_shapes(predictions, ground_truth, labels.len())?;

    let width = labels.len();
    let filter = ColumnFilter::from_ground_truth(ground_truth, width);

    log::debug!("Positives per label: {:?}", column_sums(ground_truth, width));
    log::debug!("Prediction table: {} rows x {} labels", predictions.len(), width);

    if filter.removed() > 0 {
        log::warn!(
            "{} columns removed from scores computation",
            filter.removed()
        );
    }

    if filter.is_empty() {
        return Ok(Evaluation::Degraded {
            reason: DegradedReason::NoRetainedLabels,
            fallback: MetricReport::zeroed(width, Vec::new()),
        });
    }

    let preds: Vec<Vec<f32>> = predictions.iter().map(|row| filter.select(row)).collect();
    let truth: Vec<Vec<f32>> = ground_truth.iter().map(|row| filter.select(row)).collect();

    if let Some(reason) = non_finite_scores(&preds, filter.retained(), labels) {
        return Ok(Evaluation::Degraded {
            reason,
            fallback: MetricReport::zeroed(width, filter.retained().to_vec()),
        });
    }

    let lrap = label_ranking_average_precision(&preds, &truth);
    let rmse = rmse(&preds, &truth);

    let per_label: Vec<(Result<f64, CurveError>, Result<f64, CurveError>)> = (0..filter
        .retained()
        .len())
        .into_par_iter()
        .map(|pos| {
            let scores = ColumnFilter::column(&preds, pos);
            let targets = ColumnFilter::column(&truth, pos);
            (
                roc_auc(&scores, &targets),
                average_precision(&scores, &targets),
            )
        })
        .collect();

    let mut roc_per_label = Vec::with_capacity(per_label.len());
    let mut pr_per_label = Vec::with_capacity(per_label.len());
    let mut failure = None;

    for (pos, (roc, pr)) in per_label.into_iter().enumerate() {
        // Curves are independent: an all-positive column still has a PR value
        let mut record = |result: Result<f64, CurveError>, values: &mut Vec<f64>| match result {
            Ok(value) => values.push(value),
            Err(source) => {
                if failure.is_none() {
                    let col = filter.retained()[pos];
                    failure = Some(DegradedReason::Curve {
                        label: labels[col].as_ref().to_string(),
                        source,
                    });
                }
            }
        };
        record(roc, &mut roc_per_label);
        record(pr, &mut pr_per_label);
    }

    let retained = filter.retained().to_vec();

    if let Some(reason) = failure {
        // Only the per-label vectors and the ROC macro depend on every
        // retained label having both classes.
        let mut fallback = MetricReport::zeroed(width, retained);
        fallback.lrap = lrap;
        fallback.rmse = rmse;
        fallback.pr_auc = macro_average(&pr_per_label);
        return Ok(Evaluation::Degraded { reason, fallback });
    }

    Ok(Evaluation::Scored(MetricReport {
        accuracy: 0.0,
        lrap,
        rmse,
        roc_auc: macro_average(&roc_per_label),
        pr_auc: macro_average(&pr_per_label),
        roc_auc_per_label: roc_per_label,
        pr_auc_per_label: pr_per_label,
        retained,
    }))
}

fn non_finite_scores<S: AsRef<str>>(
    preds: &[Vec<f32>],
    retained: &[usize],
    labels: &[S],
) -> Option<DegradedReason> {
    let mut first = None;
    let mut count = 0;

    for (row, values) in preds.iter().enumerate() {
        for (pos, value) in values.iter().enumerate() {
            if !value.is_finite() {
                count += 1;
                first.get_or_insert((row, retained[pos]));
            }
        }
    }

    first.map(|(row, col)| DegradedReason::NonFiniteScores {
        count,
        row,
        label: labels[col].as_ref().to_string(),
    })
}

fn macro_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn check_shapes(
    predictions: &[Vec<f32>],
    ground_truth: &[Vec<f32>],
    width: usize,
) -> Result<(), ShapeError> {
    if predictions.len() != ground_truth.len() {
        return Err(ShapeError::RowCount {
            predictions: predictions.len(),
            ground_truth: ground_truth.len(),
        });
    }

    for (table, rows) in [("prediction", predictions), ("ground truth", ground_truth)] {
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != width)
        {
            return Err(ShapeError::Width {
                table,
                row,
                width: values.len(),
                expected: width,
            });
        }
    }

    Ok(())
}
