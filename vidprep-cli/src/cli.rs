// vidprep-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Vidprep: video dataset preparation toolkit",
    long_about = "Prepares video datasets (metadata augmentation, splitting, frame \
                  extraction) and drives experiment runs through the vidprep-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory of the raw datasets
    #[arg(long, global = true, value_name = "DATA_ROOT", env = "VIDPREP_DATA_ROOT", default_value = "data")]
    pub data_root: PathBuf,

    /// Root directory for derived artifacts (splits, frames, runs)
    #[arg(long, global = true, value_name = "WORK_ROOT", env = "VIDPREP_WORK_ROOT", default_value = "work")]
    pub work_root: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates the work-root layout for a dataset and checks its raw data
    Setup(SetupArgs),
    /// Restricts a dataset's metadata to its most frequent labels
    SelectSubset(SelectSubsetArgs),
    /// Runs the preprocessing pipeline for one split
    PreproSet(PreproSetArgs),
    /// Runs a named experiment spec
    RunExperiment(RunExperimentArgs),
    /// Evaluates a previously run experiment
    EvaluateExperiment(EvaluateExperimentArgs),
    /// Renders model diagnostics for a previously run experiment
    VisualiseModel(VisualiseModelArgs),
}

#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Dataset tag ('smth' or 'hmdb')
    #[arg(short, long, value_name = "SET")]
    pub set: String,
}

#[derive(Parser, Debug)]
pub struct SelectSubsetArgs {
    /// Dataset tag ('smth' or 'hmdb')
    #[arg(short, long, value_name = "SET")]
    pub set: String,

    /// Keep the N most frequent labels
    #[arg(short, long, value_name = "COUNT")]
    pub num_classes: usize,
}

#[derive(Parser, Debug)]
pub struct PreproSetArgs {
    /// Dataset tag ('smth' or 'hmdb')
    #[arg(short, long, value_name = "SET")]
    pub set: String,

    /// Split number (seeds the train/dev/test partition)
    #[arg(long, value_name = "SPLIT", default_value_t = 1)]
    pub split: u32,

    /// Also extract per-video JPEG frame directories
    #[arg(long)]
    pub jpeg: bool,
}

#[derive(Parser, Debug)]
pub struct RunExperimentArgs {
    /// Name of a built-in run spec
    #[arg(long, value_name = "SPEC")]
    pub spec: String,

    /// Continue an existing run directory instead of refusing it
    #[arg(long)]
    pub resume: bool,
}

#[derive(Parser, Debug)]
pub struct EvaluateExperimentArgs {
    /// Name of a previously run experiment
    #[arg(long, value_name = "SPEC")]
    pub spec: String,
}

#[derive(Parser, Debug)]
pub struct VisualiseModelArgs {
    /// Name of a previously run experiment
    #[arg(long, value_name = "SPEC")]
    pub spec: String,
}
