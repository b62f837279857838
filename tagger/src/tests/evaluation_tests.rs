use candle_core::{Device, Tensor};
use tempfile::tempdir;

use super::common::{echo_batch, label_names, separable_stream, tiny_tagger, MemoryStream};
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::error::TaggerError;
use crate::evaluation::Evaluator;
use crate::labels::{ArtifactNames, Subset};
use crate::schedule::Dwell;
use crate::training::{TrainConfig, Trainer};

fn read_vector(path: &std::path::Path) -> Vec<f64> {
    Tensor::read_npy(path).unwrap().to_vec1::<f64>().unwrap()
}

#[test]
fn test_missing_checkpoint_reads_no_batch() {
    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(2, 2).unwrap();
    let mut stream = separable_stream();

    let mut evaluator = Evaluator::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        Checkpoint::best_model(dir.path()),
        ArtifactNames::new(Subset::MoodTheme, 0),
        dir.path(),
    );

    match evaluator.run(&mut stream) {
        Err(TaggerError::Checkpoint(CheckpointError::NotFound(_))) => {}
        other => panic!("expected missing checkpoint, got {other:?}"),
    }
    assert_eq!(stream.reads, 0);
    assert!(!evaluator.roc_auc_path().exists());
    assert!(!evaluator.pr_auc_path().exists());
}

#[test]
fn test_writes_full_width_vectors() {
    let dir = tempdir().unwrap();
    let checkpoint = Checkpoint::best_model(dir.path());

    // Three labels, the last one never positive in either split
    let rows: [&[f32]; 2] = [&[1., 0., 0.], &[0., 1., 0.]];
    let stream = || MemoryStream::new(vec![echo_batch(&rows), echo_batch(&rows)]);

    let (model, varmap) = tiny_tagger(3, 3).unwrap();
    let mut trainer = Trainer::new(
        model,
        varmap,
        Device::Cpu,
        label_names(3),
        checkpoint.clone(),
        TrainConfig {
            epochs: 2,
            learning_rate: 1e-2,
            log_step: 1,
            dwell: Dwell::default(),
        },
    )
    .unwrap();
    trainer.train(&mut stream(), &mut stream()).unwrap();
    assert!(checkpoint.exists());

    let (model, varmap) = tiny_tagger(3, 3).unwrap();
    let output = dir.path().join("results");
    let mut evaluator = Evaluator::new(
        model,
        varmap,
        Device::Cpu,
        label_names(3),
        checkpoint,
        ArtifactNames::new(Subset::Genre, 2),
        &output,
    );

    let mut test = stream();
    let report = evaluator.run(&mut test).unwrap();
    assert_eq!(test.reads, 1);
    assert_eq!(report.retained, vec![0, 1]);
    assert_eq!(report.roc_auc, 1.0);

    let roc_path = output.join("roc_auc_genre_2.npy");
    let pr_path = output.join("pr_auc_genre_2.npy");
    assert_eq!(evaluator.roc_auc_path(), roc_path);
    assert_eq!(evaluator.pr_auc_path(), pr_path);

    assert_eq!(read_vector(&roc_path), vec![1.0, 1.0, 0.0]);
    assert_eq!(read_vector(&pr_path), vec![1.0, 1.0, 0.0]);
}

#[test]
fn test_unreadable_track_fails_without_artifacts() {
    use crate::dataset::{Dataset, LoadError, LoaderConfig, Track};

    let dir = tempdir().unwrap();
    let (model, varmap) = tiny_tagger(4, 2).unwrap();
    let checkpoint = Checkpoint::best_model(dir.path());
    checkpoint.save(&varmap).unwrap();

    let tracks = vec![Track {
        id: "1".to_string(),
        mel_path: dir.path().join("missing.npy"),
        labels: vec![0],
    }];
    let config = LoaderConfig {
        batch_size: 2,
        workers: 1,
        n_mels: 2,
        input_length: 2,
    };
    let mut test = Dataset::from_tracks(tracks, 2, config);

    let mut evaluator = Evaluator::new(
        model,
        varmap,
        Device::Cpu,
        label_names(2),
        checkpoint,
        ArtifactNames::new(Subset::All, 0),
        dir.path(),
    );

    match evaluator.run(&mut test) {
        Err(TaggerError::Load(LoadError::Read { path, .. })) => {
            assert!(path.ends_with("missing.npy"))
        }
        other => panic!("expected read failure, got {other:?}"),
    }
    assert!(!evaluator.roc_auc_path().exists());
    assert!(!evaluator.pr_auc_path().exists());
}
