//! Experiment run specifications.
//!
//! A `RunSpec` is the composite configuration of one experiment: the model
//! family and its hyperparameters, optimizer and trainer options, evaluator
//! options, and the data bunch/set/loader options for both the training and
//! validation sides. Model, optimizer, and metric settings are carried
//! opaquely for the training collaborators on the other side of the runner
//! seam; this crate only routes on the family tag and feeds the data
//! pipeline.

pub mod registry;

use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::jobs::DatasetTag;
use crate::pipeline::{DataBunchOptions, DataLoaderOptions, DataSetOptions};

/// Model family discriminant used to select runner and evaluator
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Plain classifier
    Class,
    /// Autoencoder
    Ae,
    /// Gaussian stochastic neural network
    Gsnn,
    /// Variational autoencoder
    Vae,
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ModelFamily::Class => "class",
            ModelFamily::Ae => "ae",
            ModelFamily::Gsnn => "gsnn",
            ModelFamily::Vae => "vae",
        };
        f.write_str(tag)
    }
}

/// Architecture hyperparameters, tagged by architecture name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "arch", rename_all = "lowercase")]
pub enum ModelOptions {
    Lrcn {
        num_classes: usize,
        freeze_features: bool,
        freeze_fusion: bool,
    },
    I3d {
        num_classes: usize,
        modality: String,
        dropout_prob: f64,
        name: String,
    },
    Tadn {
        num_classes: usize,
        time_steps: usize,
        growth_rate: usize,
        drop_rate: f64,
    },
}

/// The model side of a run: family tag plus architecture options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(rename = "type")]
    pub family: ModelFamily,
    pub options: ModelOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Adam,
    RmsProp,
}

/// Adam-style optimizer hyperparameters; unused members keep their defaults
/// for the other kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerOptions {
    pub lr: f64,
    #[serde(default = "OptimizerOptions::default_betas")]
    pub betas: (f64, f64),
    #[serde(default = "OptimizerOptions::default_eps")]
    pub eps: f64,
    #[serde(default)]
    pub weight_decay: f64,
    #[serde(default)]
    pub amsgrad: bool,
}

impl OptimizerOptions {
    fn default_betas() -> (f64, f64) {
        (0.9, 0.999)
    }

    fn default_eps() -> f64 {
        1e-8
    }
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        OptimizerOptions {
            lr: 0.001,
            betas: Self::default_betas(),
            eps: Self::default_eps(),
            weight_decay: 0.0,
            amsgrad: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerOptions {
    pub epochs: u32,
    pub optimizer: OptimizerKind,
    pub optimizer_options: OptimizerOptions,
}

/// Metric names evaluated downstream, e.g. `acc@1`, `acc@3`, `loss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorOptions {
    pub metrics: Vec<String>,
}

/// The full configuration of one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub name: String,
    pub set: DatasetTag,
    pub split: u32,
    pub resume: bool,
    /// Batches between progress log lines
    pub log_interval: u32,
    /// Early-stopping patience, carried for the trainer collaborator
    pub patience: u32,
    pub model: ModelSpec,
    pub data_bunch: DataBunchOptions,
    pub train_data_set: DataSetOptions,
    pub valid_data_set: DataSetOptions,
    pub train_data_loader: DataLoaderOptions,
    pub valid_data_loader: DataLoaderOptions,
    pub trainer: TrainerOptions,
    pub evaluator: EvaluatorOptions,
}

impl RunSpec {
    /// Persists the spec into its run directory so evaluation jobs can
    /// reload the exact configuration that trained.
    pub fn save(&self, config: &CoreConfig) -> CoreResult<()> {
        let path = config.spec_path(&self.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        log::debug!("Persisted run spec to {}", path.display());
        Ok(())
    }

    /// Loads the persisted spec of a named run.
    pub fn load(config: &CoreConfig, name: &str) -> CoreResult<Self> {
        let path = config.spec_path(name);
        let contents = fs::read_to_string(&path).map_err(|e| {
            CoreError::Config(format!(
                "no persisted spec for run '{name}' at '{}': {e}",
                path.display()
            ))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use tempfile::tempdir;

    #[test]
    fn spec_round_trips_through_the_run_directory() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(
            dir.path().join("data"),
            dir.path().join("work"),
        );
        let spec = registry::build_spec("dev_i3d_smth").unwrap();

        spec.save(&config).unwrap();
        let back = RunSpec::load(&config, &spec.name).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn loading_an_unsaved_spec_is_a_config_error() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(
            dir.path().join("data"),
            dir.path().join("work"),
        );
        let err = RunSpec::load(&config, "nope").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn family_tag_serializes_as_type() {
        let spec = registry::build_spec("lrcn_smth").unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["model"]["type"], "class");
    }
}
