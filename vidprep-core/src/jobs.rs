//! Job options and dispatch.
//!
//! Every CLI job is a structured options value; `dispatch` routes each
//! variant to its implementation and nothing else. The routing is an
//! exhaustive match over a sum type, so an unhandled job shape is a compile
//! error rather than a fall-through, and unsupported *combinations* fail
//! with a configuration error naming the offending options value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::prepro;
use crate::probe::FfprobeProber;
use crate::run;
use crate::specs::{registry, RunSpec};

/// Supported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetTag {
    /// Something-Something
    Smth,
    /// HMDB
    Hmdb,
}

impl DatasetTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetTag::Smth => "smth",
            DatasetTag::Hmdb => "hmdb",
        }
    }
}

impl FromStr for DatasetTag {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "smth" => Ok(DatasetTag::Smth),
            "hmdb" => Ok(DatasetTag::Hmdb),
            other => Err(CoreError::Config(format!(
                "unknown dataset '{other}'; expected 'smth' or 'hmdb'"
            ))),
        }
    }
}

impl fmt::Display for DatasetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupOptions {
    pub set: DatasetTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectSubsetOptions {
    pub set: DatasetTag,
    /// Keep the N most frequent labels
    pub num_classes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreproSetOptions {
    pub set: DatasetTag,
    pub split: u32,
    /// Also extract per-video JPEG frame directories
    pub jpeg: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExperimentOptions {
    /// Name of a registry spec
    pub spec: String,
    pub resume: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateExperimentOptions {
    /// Name of a previously run experiment
    pub spec: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualiseModelOptions {
    pub spec: String,
}

/// The job sum type the CLI builds and `dispatch` routes on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobOptions {
    Setup(SetupOptions),
    SelectSubset(SelectSubsetOptions),
    PreproSet(PreproSetOptions),
    RunExperiment(RunExperimentOptions),
    EvaluateExperiment(EvaluateExperimentOptions),
    VisualiseModel(VisualiseModelOptions),
}

/// Routes a job to its implementation. Stateless; holds no business logic.
pub fn dispatch(config: &CoreConfig, opts: &JobOptions) -> CoreResult<()> {
    match opts {
        JobOptions::Setup(o) => prepro::setup(config, o.set),
        JobOptions::SelectSubset(o) => match o.set {
            DatasetTag::Smth => prepro::select_subset(config, o),
            DatasetTag::Hmdb => Err(CoreError::Config(format!(
                "unhandled job options: {o:?} (subset selection only exists for smth)"
            ))),
        },
        JobOptions::PreproSet(o) => prepro::prepro_set(config, o, &FfprobeProber),
        JobOptions::RunExperiment(o) => {
            let mut spec = registry::build_spec(&o.spec)?;
            spec.resume = o.resume;
            run::run_experiment(config, spec)
        }
        JobOptions::EvaluateExperiment(o) => {
            let spec = RunSpec::load(config, &o.spec)?;
            run::evaluate_experiment(config, spec)
        }
        JobOptions::VisualiseModel(o) => Err(CoreError::Config(format!(
            "unhandled job options: {o:?} (model visualisation is not implemented)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> CoreConfig {
        CoreConfig::new(PathBuf::from("/data"), PathBuf::from("/work"))
    }

    #[test]
    fn dataset_tags_parse_and_reject() {
        assert_eq!("smth".parse::<DatasetTag>().unwrap(), DatasetTag::Smth);
        assert_eq!("hmdb".parse::<DatasetTag>().unwrap(), DatasetTag::Hmdb);
        assert!("ucf".parse::<DatasetTag>().is_err());
    }

    #[test]
    fn subset_selection_for_hmdb_names_the_options() {
        let opts = JobOptions::SelectSubset(SelectSubsetOptions {
            set: DatasetTag::Hmdb,
            num_classes: 10,
        });
        let err = dispatch(&config(), &opts).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Hmdb"));
        assert!(message.contains("num_classes: 10"));
    }

    #[test]
    fn unknown_spec_name_fails_before_any_work() {
        let opts = JobOptions::RunExperiment(RunExperimentOptions {
            spec: "no_such_spec".to_string(),
            resume: false,
        });
        let err = dispatch(&config(), &opts).unwrap_err();
        assert!(err.to_string().contains("no_such_spec"));
    }

    #[test]
    fn visualisation_is_routed_but_unimplemented() {
        let opts = JobOptions::VisualiseModel(VisualiseModelOptions {
            spec: "lrcn_smth".to_string(),
        });
        let err = dispatch(&config(), &opts).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn job_options_serialize_with_a_job_tag() {
        let opts = JobOptions::PreproSet(PreproSetOptions {
            set: DatasetTag::Smth,
            split: 1,
            jpeg: true,
        });
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["job"], "prepro_set");
        assert_eq!(json["set"], "smth");
    }
}
