use candle_core::{DType, Tensor};
use rand::Rng;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use super::{Batch, LoaderConfig, Track};

/// A track whose spectrogram could not be turned into a window. Fatal to
/// the pass that hit it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: candle_core::Error,
    },
    #[error("{path} has {found} mel bins, expected {expected}")]
    MelBins {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

// Holds x items in the channel per worker
const CHANNEL_BUFFER_MULTIPLIER: usize = 2;

/// Where a fixed-length window is cut from a longer spectrogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    Random,
    Center,
}

impl Crop {
    fn offset(self, frames: usize, length: usize) -> usize {
        if frames <= length {
            return 0;
        }
        match self {
            Crop::Random => rand::thread_rng().gen_range(0..=frames - length),
            Crop::Center => (frames - length) / 2,
        }
    }
}

/// Multi-threaded loader that reads mel spectrograms on demand.
///
/// Workers pull chunks of tracks, decode their `.npy` files, crop them to
/// `input_length` frames and send finished batches through a channel.
/// Batches arrive in completion order, not manifest order. The first
/// unreadable track is yielded as an error and ends the pass.
pub struct DataLoader {
    receiver: Option<mpsc::Receiver<Result<Batch, LoadError>>>,
    failed: bool,
    workers: Vec<thread::JoinHandle<()>>,
}

impl DataLoader {
    pub fn new(tracks: Arc<Vec<Track>>, num_labels: usize, config: LoaderConfig, crop: Crop) -> Self {
        let num_workers = config.workers.max(1);
        let (sender, receiver) = mpsc::sync_channel(num_workers * CHANNEL_BUFFER_MULTIPLIER);

        let (work_sender, work_receiver) =
            mpsc::sync_channel::<Vec<Track>>(num_workers * CHANNEL_BUFFER_MULTIPLIER);
        let work_receiver = Arc::new(Mutex::new(work_receiver));

        let workers = (0..num_workers)
            .map(|_| {
                let rx = Arc::clone(&work_receiver);
                let tx = sender.clone();
                thread::spawn(move || worker_loop(rx, tx, num_labels, config, crop))
            })
            .collect();

        // Distribute batches to workers
        let batch_size = config.batch_size.max(1);
        thread::spawn(move || {
            for chunk in tracks.chunks(batch_size) {
                if work_sender.send(chunk.to_vec()).is_err() {
                    break;
                }
            }
        });

        Self {
            receiver: Some(receiver),
            failed: false,
            workers,
        }
    }
}

fn worker_loop(
    work: Arc<Mutex<mpsc::Receiver<Vec<Track>>>>,
    sender: mpsc::SyncSender<Result<Batch, LoadError>>,
    num_labels: usize,
    config: LoaderConfig,
    crop: Crop,
) {
    loop {
        let chunk = {
            let Ok(rx) = work.lock() else {
                break;
            };
            match rx.recv() {
                Ok(chunk) => chunk,
                Err(_) => break,
            }
        };

        let mut batch = Batch {
            features: Vec::with_capacity(chunk.len() * config.n_mels * config.input_length),
            labels: Vec::with_capacity(chunk.len() * num_labels),
            len: 0,
            sample_dims: vec![config.n_mels, config.input_length],
        };

        let mut error = None;
        for track in &chunk {
            match read_window(track, config, crop) {
                Ok(window) => {
                    batch.features.extend_from_slice(&window);
                    push_multi_hot(&mut batch.labels, &track.labels, num_labels);
                    batch.len += 1;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    error = Some(e);
                    break;
                }
            }
        }

        let message = match error {
            Some(e) => Err(e),
            None if batch.is_empty() => continue,
            None => Ok(batch),
        };
        if sender.send(message).is_err() {
            break;
        }
    }
}

/// Reads a `(mels, frames)` spectrogram and returns `input_length` frames
/// of every mel bin, row-major, zero-padded on the right when short.
fn read_window(track: &Track, config: LoaderConfig, crop: Crop) -> Result<Vec<f32>, LoadError> {
    let mel = Tensor::read_npy(&track.mel_path)
        .and_then(|t| t.to_dtype(DType::F32))
        .and_then(|t| t.to_vec2::<f32>())
        .map_err(|source| LoadError::Read {
            path: track.mel_path.clone(),
            source,
        })?;

    if mel.len() != config.n_mels {
        return Err(LoadError::MelBins {
            path: track.mel_path.clone(),
            expected: config.n_mels,
            found: mel.len(),
        });
    }

    let frames = mel.first().map_or(0, Vec::len);
    Ok(crop_window(&mel, frames, config.input_length, crop.offset(frames, config.input_length)))
}

fn crop_window(mel: &[Vec<f32>], frames: usize, length: usize, offset: usize) -> Vec<f32> {
    let mut window = vec![0.0; mel.len() * length];
    let end = (offset + length).min(frames);

    for (row, bins) in mel.iter().zip(window.chunks_mut(length)) {
        let src = &row[offset..end];
        bins[..src.len()].copy_from_slice(src);
    }
    window
}

fn push_multi_hot(labels: &mut Vec<f32>, active: &[usize], num_labels: usize) {
    let start = labels.len();
    labels.resize(start + num_labels, 0.0);
    for &idx in active.iter().filter(|&&idx| idx < num_labels) {
        labels[start + idx] = 1.0;
    }
}

impl Iterator for DataLoader {
    type Item = Result<Batch, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.receiver.as_ref()?.recv().ok()?;
        self.failed = item.is_err();
        Some(item)
    }
}

impl Drop for DataLoader {
    fn drop(&mut self) {
        // Disconnect first so workers blocked on a full channel can exit
        self.receiver.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
