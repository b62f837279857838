use candle_core::Device;
use candle_nn::{ModuleT, VarMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::checkpoint::Checkpoint;
use crate::dataset::BatchStream;
use crate::error::Result;
use crate::loss::binary_cross_entropy;
use crate::optim::TaggerOptimizer;
use crate::prediction::{predict, settle};
use crate::schedule::{Action, Phase, ScheduleState, Transition};
use crate::training::metrics::BestMetric;
use crate::training::progress::{
    format_elapsed, log_iteration, timestamp, RunClock, Stage, TrainingProgressBar,
};
use crate::training::TrainConfig;

/// Run state threaded through every epoch.
pub struct TrainingContext {
    pub schedule: ScheduleState,
    pub best: BestMetric,
    pub optimizer: TaggerOptimizer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub train_loss: f32,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub best_roc_auc: f64,
    pub phase: Phase,
    pub learning_rate: f64,
}

pub struct Trainer<M> {
    model: M,
    varmap: VarMap,
    device: Device,
    labels: Vec<String>,
    checkpoint: Checkpoint,
    config: TrainConfig,
    context: TrainingContext,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl<M: ModuleT> Trainer<M> {
    /// `varmap` must hold every parameter of `model`.
    pub fn new(
        model: M,
        varmap: VarMap,
        device: Device,
        labels: Vec<String>,
        checkpoint: Checkpoint,
        config: TrainConfig,
    ) -> Result<Self> {
        config.validate()?;
        let optimizer = TaggerOptimizer::adam(varmap.all_vars(), config.learning_rate)?;
        let context = TrainingContext {
            schedule: ScheduleState::new(config.dwell),
            best: BestMetric::new(),
            optimizer,
        };

        Ok(Self {
            model,
            varmap,
            device,
            labels,
            checkpoint,
            config,
            context,
            stop_flag: None,
        })
    }

    /// Stops after the current epoch once the flag is raised.
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(stop_flag);
        self
    }

    pub fn context(&self) -> &TrainingContext {
        &self.context
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn train<T: BatchStream, V: BatchStream>(
        &mut self,
        train: &mut T,
        valid: &mut V,
    ) -> Result<Vec<EpochSummary>> {
        let clock = RunClock::start();
        let epochs = self.config.epochs;
        let mut history = Vec::with_capacity(epochs);

        for epoch in 1..=epochs {
            let epoch_start = Instant::now();

            let train_loss = self.train_epoch(train, epoch, &clock)?;

            let report = {
                let table = predict(
                    &self.model,
                    valid,
                    self.labels.len(),
                    &self.device,
                    self.config.log_step,
                    Stage::Valid { epoch, epochs },
                    &clock,
                )?;
                settle(::metrics::evaluate(
                    &table.predictions,
                    &table.ground_truth,
                    &self.labels,
                )?)
            };
            report.log_summary();
            report.log_per_label(&self.labels);

            if self.context.best.update(report.roc_auc, epoch) {
                log::info!("best model: {:.4}", report.roc_auc);
                self.checkpoint.save(&self.varmap)?;
            }

            if let Some(transition) = self.context.schedule.tick() {
                self.apply(transition)?;
            }

            log::info!(
                "---- Summary ----- Epoch [{}/{}], t_epoch = {:.4}, t_total = {:.4}",
                epoch,
                epochs,
                epoch_start.elapsed().as_secs_f64(),
                clock.elapsed().as_secs_f64()
            );

            history.push(EpochSummary {
                epoch,
                train_loss,
                roc_auc: report.roc_auc,
                pr_auc: report.pr_auc,
                best_roc_auc: self.context.best.roc_auc(),
                phase: self.context.schedule.phase(),
                learning_rate: self.context.optimizer.learning_rate(),
            });

            if self.should_stop() {
                log::info!("Stopping after epoch {}", epoch);
                break;
            }
        }

        log::info!(
            "[{}] Train finished. Elapsed: {}",
            timestamp(),
            format_elapsed(clock.elapsed())
        );

        Ok(history)
    }

    fn train_epoch<T: BatchStream>(
        &mut self,
        stream: &mut T,
        epoch: usize,
        clock: &RunClock,
    ) -> Result<f32> {
        let total = stream.num_batches();
        let progress = TrainingProgressBar::new(total);
        let stage = Stage::Train {
            epoch,
            epochs: self.config.epochs,
        };

        let mut total_loss = 0.0;
        let mut batches_processed = 0;

        for (iter, batch) in stream.batches().enumerate() {
            let batch = batch?;
            if batch.is_empty() {
                continue;
            }

            let (x, y) = batch.to_tensors(self.labels.len(), &self.device)?;
            let scores = self.model.forward_t(&x, true)?;
            let loss = binary_cross_entropy(&scores, &y)?;

            self.context.optimizer.backward_step(&loss)?;

            let loss_val = loss.to_vec0::<f32>()?;
            total_loss += loss_val;
            batches_processed += 1;
            progress.update(loss_val);

            let ctr = iter + 1;
            if self.config.log_step > 0 && ctr % self.config.log_step == 0 {
                log_iteration(stage, ctr, total, loss_val, clock);
            }
        }

        let train_loss = total_loss / batches_processed.max(1) as f32;
        progress.finish(train_loss);

        Ok(train_loss)
    }

    /// Restarts from the best weights, then reconfigures the optimizer.
    fn apply(&mut self, transition: Transition) -> Result<()> {
        self.checkpoint.load(&mut self.varmap)?;

        match transition.action {
            Action::SwitchToSgd(params) => {
                self.context.optimizer =
                    TaggerOptimizer::momentum_sgd(self.varmap.all_vars(), params)?;
            }
            Action::SetLearningRate(lr) => self.context.optimizer.set_learning_rate(lr),
        }

        let snapshot = self.context.optimizer.snapshot();
        log::info!(
            "{} -> {}: {:?} lr {:e}",
            transition.from,
            transition.to,
            snapshot.algorithm,
            snapshot.learning_rate
        );
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
