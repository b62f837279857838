pub mod metrics;
pub mod progress;
pub mod trainer;

pub use metrics::BestMetric;
pub use trainer::{EpochSummary, Trainer, TrainingContext};

use crate::optim::ADAM_LEARNING_RATE;
use crate::schedule::Dwell;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{phase} dwell must be at least one epoch")]
    ZeroDwell { phase: &'static str },
}

/// Iterations between two progress lines.
pub const LOG_STEP: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub log_step: usize,
    pub dwell: Dwell,
}

impl TrainConfig {
    /// A zero dwell would never match the counter, which only runs from 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dwell.adam == 0 {
            return Err(ConfigError::ZeroDwell { phase: "adam" });
        }
        if self.dwell.sgd == 0 {
            return Err(ConfigError::ZeroDwell { phase: "sgd" });
        }
        Ok(())
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            learning_rate: ADAM_LEARNING_RATE,
            log_step: LOG_STEP,
            dwell: Dwell::default(),
        }
    }
}
