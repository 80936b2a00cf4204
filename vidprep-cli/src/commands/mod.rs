//! Command implementations for the CLI.
//!
//! Every subcommand builds the matching core `JobOptions` value and hands it
//! to the core dispatcher; nothing here carries pipeline logic of its own.

use vidprep_core::{
    dispatch, CoreConfig, DatasetTag, EvaluateExperimentOptions, JobOptions, PreproSetOptions,
    RunExperimentOptions, SelectSubsetOptions, SetupOptions, VisualiseModelOptions,
};

use crate::cli::{Cli, Commands};
use crate::error::CliResult;

/// Builds the core configuration and routes the parsed command line into the
/// job dispatcher.
pub fn execute(cli: Cli) -> CliResult<()> {
    let config = CoreConfig::new(cli.data_root.clone(), cli.work_root.clone());

    let job = match &cli.command {
        Commands::Setup(args) => JobOptions::Setup(SetupOptions {
            set: parse_set(&args.set)?,
        }),
        Commands::SelectSubset(args) => JobOptions::SelectSubset(SelectSubsetOptions {
            set: parse_set(&args.set)?,
            num_classes: args.num_classes,
        }),
        Commands::PreproSet(args) => JobOptions::PreproSet(PreproSetOptions {
            set: parse_set(&args.set)?,
            split: args.split,
            jpeg: args.jpeg,
        }),
        Commands::RunExperiment(args) => JobOptions::RunExperiment(RunExperimentOptions {
            spec: args.spec.clone(),
            resume: args.resume,
        }),
        Commands::EvaluateExperiment(args) => {
            JobOptions::EvaluateExperiment(EvaluateExperimentOptions {
                spec: args.spec.clone(),
            })
        }
        Commands::VisualiseModel(args) => JobOptions::VisualiseModel(VisualiseModelOptions {
            spec: args.spec.clone(),
        }),
    };

    log::debug!("Dispatching job: {job:?}");
    dispatch(&config, &job)
}

fn parse_set(s: &str) -> CliResult<DatasetTag> {
    s.parse()
}
