mod args;

use args::Args;
use candle_core::DType;
use candle_nn::{VarBuilder, VarMap};
use clap::Parser;
use log::LevelFilter;
use simplelog::{CombinedLogger, Config, SharedLogger, SimpleLogger, WriteLogger};
use std::error::Error;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tagger::dataset::{Dataset, LoaderConfig};
use tagger::device::get_device;
use tagger::network::{Network, MIN_FRAMES, N_MELS};
use tagger::schedule::Dwell;
use tagger::{Checkpoint, LabelSet, TrainConfig, Trainer};

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
    let mut train = Dataset::load(&args.manifest("train"), &args.mel_dir, &labels, loader)?
        .for_training();
    let mut valid = Dataset::load(&args.manifest("validation"), &args.mel_dir, &labels, loader)?;

    log::info!("Creating network");
    let device = get_device()?;
    let varmap = VarMap::new();
    let vs = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let network = Network::new(&vs, labels.len())?;

    let config = TrainConfig {
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        log_step: args.log_step,
        dwell: Dwell {
            adam: args.adam_dwell,
            sgd: args.sgd_dwell,
        },
    };

    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop_flag = Arc::clone(&stop_flag);
        ctrlc::set_handler(move || {
            log::warn!("Interrupted, stopping after the current epoch");
            stop_flag.store(true, Ordering::Relaxed);
        })?;
    }

    log::info!(
        "Training on {} tracks, validating on {}",
        train.len(),
        valid.len()
    );
    let mut trainer = Trainer::new(
        network,
        varmap,
        device,
        labels.names().to_vec(),
        Checkpoint::best_model(&args.save_dir),
        config,
    )?
    .with_stop_flag(stop_flag);

    let history = trainer.train(&mut train, &mut valid)?;
    if let Some(best) = trainer.context().best.epoch() {
        log::info!(
            "Best validation ROC-AUC {:.4} at epoch {} of {}",
            trainer.context().best.roc_auc(),
            best,
            history.len()
        );
    }

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
