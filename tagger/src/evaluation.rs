use candle_core::{Device, Tensor};
use candle_nn::{ModuleT, VarMap};
use metrics::MetricReport;
use std::fs;
use std::path::{Path, PathBuf};

use crate::checkpoint::Checkpoint;
use crate::dataset::BatchStream;
use crate::error::Result;
use crate::labels::ArtifactNames;
use crate::prediction::{predict, settle};
use crate::training::progress::{format_elapsed, timestamp, RunClock, Stage};
use crate::training::LOG_STEP;

/// Scores a stored checkpoint against the test split and writes the
/// per-label AUC vectors next to the run.
pub struct Evaluator<M> {
    model: M,
    varmap: VarMap,
    device: Device,
    labels: Vec<String>,
    checkpoint: Checkpoint,
    names: ArtifactNames,
    output_dir: PathBuf,
    log_step: usize,
}

impl<M: ModuleT> Evaluator<M> {
    pub fn new(
        model: M,
        varmap: VarMap,
        device: Device,
        labels: Vec<String>,
        checkpoint: Checkpoint,
        names: ArtifactNames,
        output_dir: &Path,
    ) -> Self {
        Self {
            model,
            varmap,
            device,
            labels,
            checkpoint,
            names,
            output_dir: output_dir.to_path_buf(),
            log_step: LOG_STEP,
        }
    }

    pub fn with_log_step(mut self, log_step: usize) -> Self {
        self.log_step = log_step;
        self
    }

    pub fn roc_auc_path(&self) -> PathBuf {
        self.output_dir.join(self.names.roc_auc())
    }

    pub fn pr_auc_path(&self) -> PathBuf {
        self.output_dir.join(self.names.pr_auc())
    }

    /// Loads the checkpoint, then makes one pass over `stream`.
    ///
    /// A missing checkpoint fails before any batch is read.
    pub fn run<S: BatchStream>(&mut self, stream: &mut S) -> Result<MetricReport> {
        self.checkpoint.load(&mut self.varmap)?;
        log::info!("Evaluating {}", self.checkpoint.path().display());

        let clock = RunClock::start();
        let table = predict(
            &self.model,
            stream,
            self.labels.len(),
            &self.device,
            self.log_step,
            Stage::Test,
            &clock,
        )?;

        let report = settle(::metrics::evaluate(
            &table.predictions,
            &table.ground_truth,
            &self.labels,
        )?);
        report.log_summary();
        report.log_per_label(&self.labels);

        self.persist(&report)?;

        log::info!(
            "[{}] Evaluation finished. Elapsed: {}",
            timestamp(),
            format_elapsed(clock.elapsed())
        );
        Ok(report)
    }

    fn persist(&self, report: &MetricReport) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;

        let width = self.labels.len();
        let roc_path = self.roc_auc_path();
        Tensor::new(report.roc_auc_full_width(width), &Device::Cpu)?.write_npy(&roc_path)?;
        let pr_path = self.pr_auc_path();
        Tensor::new(report.pr_auc_full_width(width), &Device::Cpu)?.write_npy(&pr_path)?;

        log::info!("Saved {} and {}", roc_path.display(), pr_path.display());
        Ok(())
    }
}
