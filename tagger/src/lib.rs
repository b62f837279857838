pub mod checkpoint;
pub mod dataset;
pub mod device;
pub mod error;
pub mod evaluation;
pub mod labels;
pub mod loss;
pub mod network;
pub mod optim;
pub mod prediction;
pub mod schedule;
pub mod training;

#[cfg(test)]
mod tests;

pub use checkpoint::{Checkpoint, CheckpointError};
pub use error::{Result, TaggerError};
pub use evaluation::Evaluator;
pub use labels::{ArtifactNames, LabelSet, Subset};
pub use training::{TrainConfig, Trainer};
