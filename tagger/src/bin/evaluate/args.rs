use clap::Parser;
use std::path::PathBuf;
use tagger::Subset;

#[derive(Parser, Debug, Clone)]
#[command(name = "Tagger Evaluator")]
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

    /// Label subset the model was trained on.
    #[arg(long, value_enum, default_value_t = Subset::All)]
    pub subset: Subset,

    /// Dataset split number.
    #[arg(long, default_value_t = 0)]
    pub split: u32,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = tagger::training::LOG_STEP)]
    pub log_step: usize,

    #[arg(long, default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Frames per centered crop.
    #[arg(long, default_value_t = 1366)]
    pub input_length: usize,

    /// Directory the best model is read from.
    #[arg(long, default_value = "models")]
    pub save_dir: PathBuf,

    /// Directory the per-label AUC vectors are written to.
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn test_manifest(&self) -> PathBuf {
        self.split_dir
            .join(format!("split-{}", self.split))
            .join("autotagging-test.tsv")
    }
}
