use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Wall clock started once per run; every telemetry line reports the time
/// elapsed since then.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    start: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Train { epoch: usize, epochs: usize },
    Valid { epoch: usize, epochs: usize },
    Test,
}

pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `H:MM:SS.micros`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}

pub fn log_iteration(stage: Stage, iter: usize, total: usize, loss: f32, clock: &RunClock) {
    let elapsed = format_elapsed(clock.elapsed());
    match stage {
        Stage::Train { epoch, epochs } => log::info!(
            "[{}] Epoch [{}/{}] Iter [{}/{}] train loss: {:.4} Elapsed: {}",
            timestamp(),
            epoch,
            epochs,
            iter,
            total,
            loss,
            elapsed
        ),
        Stage::Valid { epoch, epochs } => log::info!(
            "[{}] Epoch [{}/{}], Iter [{}/{}] valid loss: {:.4} Elapsed: {}",
            timestamp(),
            epoch,
            epochs,
            iter,
            total,
            loss,
            elapsed
        ),
        Stage::Test => log::info!(
            "[{}] Iter [{}/{}] test loss: {:.4} Elapsed: {}",
            timestamp(),
            iter,
            total,
            loss,
            elapsed
        ),
    }
}

pub struct TrainingProgressBar {
    bar: ProgressBar,
}

impl TrainingProgressBar {
    pub fn new(num_batches: usize) -> Self {
        let bar = ProgressBar::new(num_batches as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} {pos}/{len} [{wide_bar:.cyan/blue}] {eta_precise} | {msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }

    pub fn update(&self, loss: f32) {
        self.bar.set_message(format!("loss: {:.5}", loss));
        self.bar.inc(1);
    }

    pub fn finish(&self, train_loss: f32) {
        self.bar.set_message(format!("loss: {:.5}", train_loss));
        self.bar.finish();
    }
}
