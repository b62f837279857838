use candle_nn::VarMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const BEST_MODEL: &str = "best_model";

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no checkpoint found at {0}")]
    NotFound(PathBuf),
    #[error("checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}

/// A single named parameter slot on disk. `save` overwrites it.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.safetensors")),
        }
    }

    pub fn best_model(dir: &Path) -> Self {
        Self::new(dir, BEST_MODEL)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes to a sibling file first and renames it over the slot, so a
    /// crash mid-save leaves the previous checkpoint intact.
    pub fn save(&self, varmap: &VarMap) -> Result<(), CheckpointError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| self.io_error(source))?;
        }

        let staging = self.path.with_extension("safetensors.tmp");
        varmap.save(&staging)?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))?;

        log::debug!("Saved checkpoint to {}", self.path.display());
        Ok(())
    }

    /// Overwrites every variable in `varmap` with the stored values.
    pub fn load(&self, varmap: &mut VarMap) -> Result<(), CheckpointError> {
        if !self.exists() {
            return Err(CheckpointError::NotFound(self.path.clone()));
        }

        varmap.load(&self.path)?;

        log::debug!("Loaded checkpoint from {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
