mod args;

use args::Args;
use candle_core::DType;
use candle_nn::{VarBuilder, VarMap};
use clap::Parser;
use log::LevelFilter;
use simplelog::{CombinedLogger, Config, SharedLogger, SimpleLogger, WriteLogger};
use std::error::Error;
use std::fs::File;
use tagger::dataset::{Dataset, LoaderConfig};
use tagger::device::get_device;
use tagger::network::{Network, MIN_FRAMES, N_MELS};
use tagger::{ArtifactNames, Checkpoint, Evaluator, LabelSet};

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;

    if args.input_length < MIN_FRAMES {
        return Err(format!("--input-length must be at least {MIN_FRAMES} frames").into());
    }
    if args.batch_size == 0 {
        return Err("--batch-size must be at least 1".into());
    }

    let labels = LabelSet::load(&args.tag_dir, args.subset)?;
    let loader = LoaderConfig {
        batch_size: args.batch_size,
        workers: args.workers,
        n_mels: N_MELS,
        input_length: args.input_length,
    };

    let device = get_device()?;
    let varmap = VarMap::new();
    let vs = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let network = Network::new(&vs, labels.len())?;

    let mut evaluator = Evaluator::new(
        network,
        varmap,
        device,
        labels.names().to_vec(),
        Checkpoint::best_model(&args.save_dir),
        ArtifactNames::new(args.subset, args.split),
        &args.output_dir,
    )
    .with_log_step(args.log_step);

    let mut test = Dataset::load(&args.test_manifest(), &args.mel_dir, &labels, loader)?;
    let report = evaluator.run(&mut test)?;

    log::info!(
        "roc_auc: {:.4}, pr_auc: {:.4}",
        report.roc_auc,
        report.pr_auc
    );
    Ok(())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    let mut loggers: Vec<Box<dyn SharedLogger>> =
        vec![SimpleLogger::new(LevelFilter::Info, Config::default())];
    if let Some(path) = &args.log_file {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            File::create(path)?,
        ));
    }
    CombinedLogger::init(loggers)?;

    Ok(args)
}
