use crate::checkpoint::CheckpointError;
use crate::dataset::LoadError;
use crate::labels::LabelError;
use crate::training::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("prediction table: {0}")]
    Shape(#[from] metrics::ShapeError),
}

pub type Result<T> = std::result::Result<T, TaggerError>;
