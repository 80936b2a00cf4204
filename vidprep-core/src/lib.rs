//! Core library for video dataset preparation and segment sampling.
//!
//! This crate provides the data side of a video-understanding experiment
//! framework: row-indexed metadata tables and their augmentation with
//! ffprobe-derived attributes, temporal segment sampling, per-sample video
//! materialization from JPEG directories or container files, a parallel
//! batch loading pipeline, and the job/spec dispatch that binds it all to
//! runner and evaluator seams.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use vidprep_core::{dispatch, CoreConfig, DatasetTag, JobOptions, PreproSetOptions};
//!
//! let config = CoreConfig::new(
//!     PathBuf::from("/path/to/data"),
//!     PathBuf::from("/path/to/work"),
//! );
//! config.validate().unwrap();
//!
//! let job = JobOptions::PreproSet(PreproSetOptions {
//!     set: DatasetTag::Smth,
//!     split: 1,
//!     jpeg: true,
//! });
//! dispatch(&config, &job).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod meta;
pub mod pipeline;
pub mod prepro;
pub mod probe;
pub mod run;
pub mod specs;
pub mod video;

// Re-exports for public API
pub use config::{CoreConfig, SplitPart};
pub use error::{CoreError, CoreResult};
pub use jobs::{
    dispatch, DatasetTag, EvaluateExperimentOptions, JobOptions, PreproSetOptions,
    RunExperimentOptions, SelectSubsetOptions, SetupOptions, VisualiseModelOptions,
};
pub use meta::{MetaTable, VideoMeta};
pub use pipeline::{BatchLoader, DataLoaderOptions, DataSetOptions, VideoDataSet};
pub use probe::{FfprobeProber, ProbeReport, VideoProber};
pub use specs::{ModelFamily, RunSpec};
pub use video::{Setting, Video};
