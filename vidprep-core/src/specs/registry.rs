//! Built-in named run specifications.
//!
//! Each function assembles the full configuration of one experiment; the
//! `dev_` variants shrink epochs, batches, and workers for smoke runs on a
//! workstation.

use crate::error::{CoreError, CoreResult};
use crate::jobs::DatasetTag;
use crate::pipeline::{DataBunchOptions, DataLoaderOptions, DataSetOptions};
use crate::video::frames::FrameSource;
use crate::video::Setting;

use super::{
    EvaluatorOptions, ModelFamily, ModelOptions, ModelSpec, OptimizerKind, OptimizerOptions,
    RunSpec, TrainerOptions,
};

/// Names accepted by `build_spec`, for error messages and CLI listings.
pub const NAMES: [&str; 4] = ["lrcn_smth", "i3d_smth_025", "dev_i3d_smth", "dev_tadn_smth"];

/// Resolves a spec name to its configuration. Unknown names fail with a
/// configuration error naming the offending value.
pub fn build_spec(name: &str) -> CoreResult<RunSpec> {
    match name {
        "lrcn_smth" => Ok(lrcn_smth()),
        "i3d_smth_025" => Ok(i3d_smth_025()),
        "dev_i3d_smth" => Ok(dev_i3d_smth()),
        "dev_tadn_smth" => Ok(dev_tadn_smth()),
        other => Err(CoreError::Config(format!(
            "unknown run spec '{other}'; available: {}",
            NAMES.join(", ")
        ))),
    }
}

fn data_set(cut: f64, setting: Setting, segments: Option<(usize, usize)>) -> DataSetOptions {
    DataSetOptions {
        cut,
        setting,
        num_segments: segments.map(|(n, _)| n),
        segment_sample_size: segments.map(|(_, s)| s),
        frame_source: FrameSource::Jpeg,
    }
}

fn data_loader(batch_size: usize, shuffle: bool, num_workers: usize) -> DataLoaderOptions {
    DataLoaderOptions {
        batch_size,
        shuffle,
        num_workers,
        pin_memory: true,
        drop_last: false,
    }
}

fn standard_metrics() -> EvaluatorOptions {
    EvaluatorOptions {
        metrics: vec!["acc@1".to_string(), "acc@3".to_string(), "loss".to_string()],
    }
}

fn lrcn_smth() -> RunSpec {
    RunSpec {
        name: "lrcn_smth".to_string(),
        set: DatasetTag::Smth,
        split: 1,
        resume: false,
        log_interval: 10,
        patience: 10,
        model: ModelSpec {
            family: ModelFamily::Class,
            options: ModelOptions::Lrcn {
                num_classes: 10,
                freeze_features: true,
                freeze_fusion: false,
            },
        },
        data_bunch: DataBunchOptions { frame_size: 224 },
        train_data_set: data_set(1.0, Setting::Train, Some((16, 1))),
        valid_data_set: data_set(1.0, Setting::Valid, Some((16, 1))),
        train_data_loader: data_loader(16, true, 8),
        valid_data_loader: data_loader(16, false, 8),
        trainer: TrainerOptions {
            epochs: 100,
            optimizer: OptimizerKind::Adam,
            optimizer_options: OptimizerOptions {
                lr: 0.01,
                ..OptimizerOptions::default()
            },
        },
        evaluator: standard_metrics(),
    }
}

fn i3d_smth_025() -> RunSpec {
    RunSpec {
        name: "i3d_smth_025".to_string(),
        set: DatasetTag::Smth,
        split: 1,
        resume: false,
        log_interval: 10,
        patience: 10,
        model: ModelSpec {
            family: ModelFamily::Class,
            options: ModelOptions::I3d {
                num_classes: 10,
                modality: "rgb".to_string(),
                dropout_prob: 0.5,
                name: "inception".to_string(),
            },
        },
        data_bunch: DataBunchOptions { frame_size: 224 },
        // Quarter cut: sample from the first 25% of each video.
        train_data_set: data_set(0.25, Setting::Train, Some((4, 4))),
        valid_data_set: data_set(0.25, Setting::Valid, Some((4, 4))),
        train_data_loader: data_loader(16, true, 8),
        valid_data_loader: data_loader(16, false, 8),
        trainer: TrainerOptions {
            epochs: 50,
            optimizer: OptimizerKind::Adam,
            optimizer_options: OptimizerOptions::default(),
        },
        evaluator: standard_metrics(),
    }
}

fn dev_i3d_smth() -> RunSpec {
    let mut spec = i3d_smth_025();
    spec.name = "dev_i3d_smth".to_string();
    spec.trainer.epochs = 2;
    spec.log_interval = 1;
    spec.train_data_loader = data_loader(2, true, 0);
    spec.valid_data_loader = data_loader(2, false, 0);
    spec
}

fn dev_tadn_smth() -> RunSpec {
    RunSpec {
        name: "dev_tadn_smth".to_string(),
        set: DatasetTag::Smth,
        split: 1,
        resume: false,
        log_interval: 1,
        patience: 5,
        model: ModelSpec {
            family: ModelFamily::Ae,
            options: ModelOptions::Tadn {
                num_classes: 10,
                time_steps: 4,
                growth_rate: 64,
                drop_rate: 0.0,
            },
        },
        data_bunch: DataBunchOptions { frame_size: 224 },
        train_data_set: data_set(1.0, Setting::Train, Some((4, 1))),
        valid_data_set: data_set(1.0, Setting::Valid, Some((4, 1))),
        train_data_loader: data_loader(2, true, 0),
        valid_data_loader: data_loader(2, false, 0),
        trainer: TrainerOptions {
            epochs: 2,
            optimizer: OptimizerKind::Adam,
            optimizer_options: OptimizerOptions::default(),
        },
        evaluator: standard_metrics(),
    }
}
