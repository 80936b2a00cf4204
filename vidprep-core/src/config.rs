// ============================================================================
// vidprep-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Path Layout
//
// This module defines the configuration structure used throughout the
// vidprep-core library. It binds the two filesystem roots every operation
// works against (the raw data root and the derived work root) and centralizes
// the path layout of metadata tables, extracted frames, statistics, and run
// directories so that no other module hard-codes a path.
//
// USAGE:
// Instances of CoreConfig are created by consumers of the library (like
// vidprep-cli) and passed to the dispatch entry points.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::jobs::DatasetTag;

/// Partition of a dataset split. The `test` partition is never shuffled into
/// train/dev and keeps its upstream row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPart {
    Train,
    Dev,
    Test,
}

impl SplitPart {
    pub const ALL: [SplitPart; 3] = [SplitPart::Train, SplitPart::Dev, SplitPart::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitPart::Train => "train",
            SplitPart::Dev => "dev",
            SplitPart::Test => "test",
        }
    }
}

/// Main configuration structure for the vidprep-core library.
///
/// Holds the raw data root (read-only inputs: source videos and upstream
/// metadata) and the work root (everything vidprep derives: split tables,
/// augmented metadata, extracted frames, statistics, run directories).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory containing the raw datasets, one subdirectory per dataset
    pub data_root: PathBuf,

    /// Directory where derived artifacts are written
    pub work_root: PathBuf,
}

impl CoreConfig {
    pub fn new(data_root: PathBuf, work_root: PathBuf) -> Self {
        CoreConfig {
            data_root,
            work_root,
        }
    }

    /// Checks that the data root exists. The work root is created on demand
    /// by `setup`, so only its parent layout is the caller's business.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.data_root.is_dir() {
            return Err(CoreError::InvalidPath(format!(
                "data root '{}' is not a directory",
                self.data_root.display()
            )));
        }
        Ok(())
    }

    // ---- Raw data layout ----

    /// Root of one dataset's raw files; metadata `video_path` values are
    /// relative to this directory.
    pub fn dataset_data_root(&self, set: DatasetTag) -> PathBuf {
        self.data_root.join(set.as_str())
    }

    /// The upstream metadata table covering the whole dataset.
    pub fn full_meta_path(&self, set: DatasetTag) -> PathBuf {
        self.dataset_data_root(set).join("meta.json")
    }

    // ---- Derived (work root) layout ----

    pub fn dataset_work_root(&self, set: DatasetTag) -> PathBuf {
        self.work_root.join(set.as_str())
    }

    pub fn meta_dir(&self, set: DatasetTag) -> PathBuf {
        self.dataset_work_root(set).join("meta")
    }

    /// Metadata table for one partition of one numbered split.
    pub fn split_meta_path(&self, set: DatasetTag, split: u32, part: SplitPart) -> PathBuf {
        self.meta_dir(set)
            .join(format!("meta.split{}.{}.json", split, part.as_str()))
    }

    /// Subset metadata table written by `select_subset`.
    pub fn subset_meta_path(&self, set: DatasetTag) -> PathBuf {
        self.meta_dir(set).join("meta.subset.json")
    }

    /// Root of extracted JPEG frame directories, one per video id.
    pub fn jpeg_root(&self, set: DatasetTag) -> PathBuf {
        self.dataset_work_root(set).join("jpeg")
    }

    pub fn stats_dir(&self, set: DatasetTag) -> PathBuf {
        self.dataset_work_root(set).join("stats")
    }

    pub fn stats_path(&self, set: DatasetTag, split: u32) -> PathBuf {
        self.stats_dir(set).join(format!("split{split}.json"))
    }

    // ---- Experiment runs ----

    pub fn runs_dir(&self) -> PathBuf {
        self.work_root.join("runs")
    }

    pub fn run_dir(&self, name: &str) -> PathBuf {
        self.runs_dir().join(name)
    }

    pub fn spec_path(&self, name: &str) -> PathBuf {
        self.run_dir(name).join("spec.json")
    }
}

/// Resolves a metadata-relative path against a root, rejecting absolute
/// entries so a table cannot point outside its dataset.
pub fn resolve_relative(root: &Path, relative: &str) -> CoreResult<PathBuf> {
    let rel = Path::new(relative);
    if rel.is_absolute() {
        return Err(CoreError::InvalidPath(format!(
            "metadata path '{relative}' must be relative"
        )));
    }
    Ok(root.join(rel))
}
