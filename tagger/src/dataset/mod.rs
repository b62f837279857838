mod loader;
mod manifest;

pub use loader::{Crop, DataLoader, LoadError};
pub use manifest::{read_manifest, Track};

use candle_core::{Device, Tensor};
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::labels::LabelSet;

/// One mini-batch: `len` samples of `sample_dims` features each, and a
/// row-major multi-hot label matrix.
#[derive(Debug, Clone)]
pub struct Batch {
    pub features: Vec<f32>,
    pub labels: Vec<f32>,
    pub len: usize,
    pub sample_dims: Vec<usize>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn to_tensors(&self, num_labels: usize, device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
        let mut dims = Vec::with_capacity(self.sample_dims.len() + 1);
        dims.push(self.len);
        dims.extend_from_slice(&self.sample_dims);

        let x = Tensor::from_slice(&self.features, dims, device)?;
        let y = Tensor::from_slice(&self.labels, (self.len, num_labels), device)?;
        Ok((x, y))
    }
}

/// A finite stream of batches that restarts from the beginning on every
/// call to `batches`. An error ends the pass.
pub trait BatchStream {
    type Batches: Iterator<Item = Result<Batch, LoadError>>;

    fn num_batches(&self) -> usize;

    fn batches(&mut self) -> Self::Batches;
}

#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub workers: usize,
    pub n_mels: usize,
    pub input_length: usize,
}

/// Tracks of one split, streamed from their mel spectrogram files.
pub struct Dataset {
    tracks: Vec<Track>,
    num_labels: usize,
    config: LoaderConfig,
    crop: Crop,
    shuffle: bool,
}

impl Dataset {
    pub fn load(
        manifest: &Path,
        mel_root: &Path,
        labels: &LabelSet,
        config: LoaderConfig,
    ) -> io::Result<Self> {
        log::info!("Loading manifest {:?}...", manifest);

        let file = File::open(manifest)?;
        let tracks = read_manifest(BufReader::new(file), labels, mel_root)?;

        let untagged = tracks.iter().filter(|t| t.labels.is_empty()).count();
        log::info!("Found {} tracks", tracks.len());
        if untagged > 0 {
            log::debug!("{} tracks carry no tag of the active subset", untagged);
        }

        Ok(Self::from_tracks(tracks, labels.len(), config))
    }

    pub fn from_tracks(tracks: Vec<Track>, num_labels: usize, config: LoaderConfig) -> Self {
        Self {
            tracks,
            num_labels,
            config,
            crop: Crop::Center,
            shuffle: false,
        }
    }

    /// Shuffles every epoch and crops at random offsets.
    pub fn for_training(mut self) -> Self {
        self.crop = Crop::Random;
        self.shuffle = true;
        self
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl BatchStream for Dataset {
    type Batches = DataLoader;

    fn num_batches(&self) -> usize {
        self.tracks.len().div_ceil(self.config.batch_size.max(1))
    }

    fn batches(&mut self) -> DataLoader {
        if self.shuffle {
            self.tracks.shuffle(&mut rand::thread_rng());
        }
        DataLoader::new(
            Arc::new(self.tracks.clone()),
            self.num_labels,
            self.config,
            self.crop,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tracks(count: usize) -> Vec<Track> {
        (0..count)
            .map(|i| Track {
                id: i.to_string(),
                mel_path: PathBuf::from(format!("{i}.npy")),
                labels: Vec::new(),
            })
            .collect()
    }

    fn config(batch_size: usize) -> LoaderConfig {
        LoaderConfig {
            batch_size,
            workers: 1,
            n_mels: 2,
            input_length: 2,
        }
    }

    #[test]
    fn test_num_batches_rounds_up() {
        assert_eq!(Dataset::from_tracks(tracks(5), 1, config(2)).num_batches(), 3);
        assert_eq!(Dataset::from_tracks(tracks(4), 1, config(2)).num_batches(), 2);
    }

    #[test]
    fn test_zero_batch_size_counts_single_tracks() {
        assert_eq!(Dataset::from_tracks(tracks(5), 1, config(0)).num_batches(), 5);
    }
}
