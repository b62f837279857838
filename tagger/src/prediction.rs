use candle_core::{Device, Tensor};
use candle_nn::ModuleT;
use metrics::{Evaluation, MetricReport};

use crate::dataset::BatchStream;
use crate::error::Result;
use crate::loss::binary_cross_entropy;
use crate::training::progress::{log_iteration, RunClock, Stage};

/// Scores and ground truth of one pass over a stream, in stream order.
#[derive(Debug, Clone, Default)]
pub struct PredictionTable {
    pub predictions: Vec<Vec<f32>>,
    pub ground_truth: Vec<Vec<f32>>,
}

impl PredictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&mut self, predictions: &Tensor, ground_truth: &Tensor) -> Result<()> {
        self.predictions.extend(predictions.to_vec2::<f32>()?);
        self.ground_truth.extend(ground_truth.to_vec2::<f32>()?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Runs `model` in evaluation mode over one full pass of `stream`.
///
/// Shared by validation and the evaluation runner; only the log prefix
/// differs between the two.
pub fn predict<M: ModuleT, S: BatchStream>(
    model: &M,
    stream: &mut S,
    num_labels: usize,
    device: &Device,
    log_step: usize,
    stage: Stage,
    clock: &RunClock,
) -> Result<PredictionTable> {
    let mut table = PredictionTable::new();
    let total = stream.num_batches();

    for (iter, batch) in stream.batches().enumerate() {
        let batch = batch?;
        if batch.is_empty() {
            continue;
        }

        let (x, y) = batch.to_tensors(num_labels, device)?;
        let scores = model.forward_t(&x, false)?;

        let ctr = iter + 1;
        if log_step > 0 && ctr % log_step == 0 {
            let loss = binary_cross_entropy(&scores, &y)?.to_vec0::<f32>()?;
            log_iteration(stage, ctr, total, loss, clock);
        }

        table.push_batch(&scores, &y)?;
    }

    Ok(table)
}

/// Applies the zero fallback of a degraded evaluation.
pub fn settle(evaluation: Evaluation) -> MetricReport {
    match evaluation {
        Evaluation::Scored(report) => report,
        Evaluation::Degraded { reason, fallback } => {
            log::warn!("Something wrong with evaluation: {}", reason);
            fallback
        }
    }
}
