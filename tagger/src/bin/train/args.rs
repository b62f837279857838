use clap::Parser;
use std::path::PathBuf;
use tagger::schedule::{ADAM_DWELL, SGD_DWELL};
use tagger::Subset;

#[derive(Parser, Debug, Clone)]
#[command(name = "Tagger Trainer")]
#[command(version)]
pub struct Args {
    /// Directory holding the split manifests (`split-<n>/autotagging-*.tsv`).
    #[arg(long, default_value = "data/splits")]
    pub split_dir: PathBuf,

    /// Root the manifest PATH column is resolved against.
    #[arg(long, default_value = "data/melspecs")]
    pub mel_dir: PathBuf,

    /// Directory holding `tag_list.txt` and `tag_list_50.txt`.
    #[arg(long, default_value = "data/tags")]
    pub tag_dir: PathBuf,

    /// Label subset to train on.
    #[arg(long, value_enum, default_value_t = Subset::All)]
    pub subset: Subset,

    /// Dataset split number.
    #[arg(long, default_value_t = 0)]
    pub split: u32,

    /// Number of tracks per batch.
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Maximum number of training epochs.
    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    /// Learning rate of the initial Adam phase.
    #[arg(long, default_value_t = tagger::optim::ADAM_LEARNING_RATE)]
    pub learning_rate: f64,

    /// Epochs before leaving the Adam phase.
    #[arg(long, default_value_t = ADAM_DWELL)]
    pub adam_dwell: usize,

    /// Epochs spent in each SGD phase.
    #[arg(long, default_value_t = SGD_DWELL)]
    pub sgd_dwell: usize,

    /// Iterations between two progress lines.
    #[arg(long, default_value_t = tagger::training::LOG_STEP)]
    pub log_step: usize,

    /// Number of data loader workers.
    #[arg(long, default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Frames per training crop.
    #[arg(long, default_value_t = 1366)]
    pub input_length: usize,

    /// Directory the best model is written to.
    #[arg(long, default_value = "models")]
    pub save_dir: PathBuf,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn manifest(&self, stage: &str) -> PathBuf {
        self.split_dir
            .join(format!("split-{}", self.split))
            .join(format!("autotagging-{stage}.tsv"))
    }
}
