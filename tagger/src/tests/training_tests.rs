use candle_core::Device;
use tempfile::tempdir;

use super::common::{
    echo_batch, label_names, parameters, separable_stream, tiny_tagger, MemoryStream,
};
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::error::TaggerError;
use crate::optim::Algorithm;
use crate::schedule::{Dwell, Phase, SGD_PHASE_2_LEARNING_RATE, SGD_PHASE_3_LEARNING_RATE};
use crate::training::{TrainConfig, Trainer};

fn config(epochs: usize, dwell: Dwell) -> TrainConfig {
    TrainConfig {
        epochs,
        learning_rate: 1e-2,
        log_step: 1,
        dwell,
    }
}

#[test]
fn test_schedule_visits_phases_in_order() {
    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(2, 2).unwrap();
    let checkpoint = Checkpoint::best_model(dir.path());

    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        checkpoint.clone(),
        config(4, Dwell { adam: 1, sgd: 1 }),
    )
    .unwrap();

    let history = trainer
        .train(&mut separable_stream(), &mut separable_stream())
        .unwrap();

    let phases: Vec<Phase> = history.iter().map(|s| s.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::SgdPhase1,
            Phase::SgdPhase2,
            Phase::SgdPhase3,
            Phase::SgdPhase3
        ]
    );
    assert_eq!(history[1].learning_rate, SGD_PHASE_2_LEARNING_RATE);
    assert_eq!(history[3].learning_rate, SGD_PHASE_3_LEARNING_RATE);

    let snapshot = trainer.context().optimizer.snapshot();
    assert_eq!(snapshot.algorithm, Algorithm::MomentumSgd);
    assert!(checkpoint.exists());
}

#[test]
fn test_best_roc_auc_never_decreases() {
    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(2, 2).unwrap();

    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        Checkpoint::best_model(dir.path()),
        config(5, Dwell::default()),
    )
    .unwrap();

    let history = trainer
        .train(&mut separable_stream(), &mut separable_stream())
        .unwrap();

    assert_eq!(history.len(), 5);
    for pair in history.windows(2) {
        assert!(pair[1].best_roc_auc >= pair[0].best_roc_auc);
    }
    for summary in &history {
        assert!(summary.best_roc_auc >= summary.roc_auc);
        assert_eq!(summary.phase, Phase::Adam);
    }
    assert_eq!(trainer.context().best.epoch(), Some(1));
}

#[test]
fn test_first_epoch_writes_checkpoint() {
    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(2, 2).unwrap();
    let checkpoint = Checkpoint::best_model(dir.path());

    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        checkpoint.clone(),
        config(1, Dwell::default()),
    )
    .unwrap();
    trainer
        .train(&mut separable_stream(), &mut separable_stream())
        .unwrap();

    assert!(checkpoint.exists());
}

#[test]
fn test_transition_without_checkpoint_fails() {
    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(2, 2).unwrap();

    // Validation without any positive label never scores above zero
    let mut valid = MemoryStream::new(vec![echo_batch(&[&[0., 0.], &[0., 0.]])]);

    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        Checkpoint::best_model(dir.path()),
        config(3, Dwell { adam: 1, sgd: 1 }),
    )
    .unwrap();

    match trainer.train(&mut separable_stream(), &mut valid) {
        Err(TaggerError::Checkpoint(CheckpointError::NotFound(_))) => {}
        other => panic!("expected missing checkpoint, got {other:?}"),
    }
    assert_eq!(valid.reads, 1);
}

#[test]
fn test_stop_flag_ends_after_current_epoch() {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(2, 2).unwrap();

    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        Checkpoint::best_model(dir.path()),
        config(10, Dwell::default()),
    )
    .unwrap()
    .with_stop_flag(Arc::new(AtomicBool::new(true)));

    let history = trainer
        .train(&mut separable_stream(), &mut separable_stream())
        .unwrap();
    assert_eq!(history.len(), 1);
}

fn run_two_epochs(dir: &std::path::Path, dwell: Dwell) -> Trainer<super::common::TinyTagger> {
    let (model, varmap) = tiny_tagger(2, 2).unwrap();
    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        Checkpoint::best_model(dir),
        config(2, dwell),
    )
    .unwrap();
    trainer
        .train(&mut separable_stream(), &mut separable_stream())
        .unwrap();
    trainer
}

#[test]
fn test_transition_restores_best_weights() {
    // Epoch 1 already separates both labels perfectly, so epoch 2 cannot
    // improve on it and the slot keeps the epoch 1 weights.
    let switched_dir = tempdir().unwrap();
    let switched = run_two_epochs(switched_dir.path(), Dwell { adam: 2, sgd: 20 });
    assert_eq!(switched.context().best.epoch(), Some(1));
    assert_eq!(switched.context().schedule.phase(), Phase::SgdPhase1);

    let (_, mut best) = tiny_tagger(2, 2).unwrap();
    Checkpoint::best_model(switched_dir.path())
        .load(&mut best)
        .unwrap();
    assert_eq!(parameters(switched.varmap()), parameters(&best));

    // Without the transition the live weights keep the epoch 2 update
    let stayed_dir = tempdir().unwrap();
    let stayed = run_two_epochs(stayed_dir.path(), Dwell::default());
    assert_eq!(stayed.context().schedule.phase(), Phase::Adam);
    assert_ne!(parameters(stayed.varmap()), parameters(&best));
}
