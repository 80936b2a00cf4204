//! Row-indexed metadata store for video datasets.
//!
//! A metadata table holds one row per video, keyed by an integer row index.
//! On disk the table is a JSON object mapping each index to a row object
//! (every row a mapping from column name to value), so tables written by
//! upstream tooling with the same row-oriented layout load unchanged.

pub mod augment;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// One metadata row: identity, source paths, and the technical attributes
/// filled in by the augmentation stage.
///
/// The four probed attributes stay `None` until `augment` has run; the
/// sampling pipeline refuses rows that were never augmented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    /// Dataset-unique video identifier
    pub id: String,
    /// Class label
    pub label: String,
    /// Container file path, relative to the dataset's data root
    pub video_path: String,
    /// Extracted-frames directory, relative to the dataset's JPEG root
    pub jpeg_path: String,
    /// Total frame count
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    /// Average frame rate, rounded to the nearest integer
    #[serde(default)]
    pub framerate: Option<u32>,
}

impl VideoMeta {
    /// Frame count, or a metadata error if this row was never augmented.
    pub fn frames(&self) -> CoreResult<u64> {
        self.length.ok_or_else(|| {
            CoreError::Metadata(format!(
                "video '{}' has no length; run metadata augmentation first",
                self.id
            ))
        })
    }

    pub fn is_augmented(&self) -> bool {
        self.length.is_some()
            && self.height.is_some()
            && self.width.is_some()
            && self.framerate.is_some()
    }
}

/// An ordered metadata table. Iteration order is always ascending row index,
/// independent of insertion or mutation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaTable {
    rows: BTreeMap<u64, VideoMeta>,
}

impl MetaTable {
    pub fn new() -> Self {
        MetaTable::default()
    }

    /// Reads a table from its row-indexed JSON form.
    pub fn read(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CoreError::Metadata(format!(
                "failed to read metadata table '{}': {}",
                path.display(),
                e
            ))
        })?;
        let table = serde_json::from_str(&contents)?;
        Ok(table)
    }

    /// Writes the table back out, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(self)?;
        fs::write(path, contents)?;
        log::debug!("Wrote {} metadata rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<&VideoMeta> {
        self.rows.get(&index)
    }

    pub fn get_mut(&mut self, index: u64) -> Option<&mut VideoMeta> {
        self.rows.get_mut(&index)
    }

    /// Inserts a row at a caller-chosen index, replacing any existing row.
    pub fn insert(&mut self, index: u64, row: VideoMeta) {
        self.rows.insert(index, row);
    }

    /// Rows in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &VideoMeta)> {
        self.rows.iter().map(|(index, row)| (*index, row))
    }

    /// The index set, ascending.
    pub fn indices(&self) -> Vec<u64> {
        self.rows.keys().copied().collect()
    }
}

impl FromIterator<(u64, VideoMeta)> for MetaTable {
    fn from_iter<I: IntoIterator<Item = (u64, VideoMeta)>>(iter: I) -> Self {
        MetaTable {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> VideoMeta {
        VideoMeta {
            id: id.to_string(),
            label: "waving".to_string(),
            video_path: format!("videos/{id}.webm"),
            jpeg_path: id.to_string(),
            length: None,
            height: None,
            width: None,
            framerate: None,
        }
    }

    #[test]
    fn iteration_is_index_ordered() {
        let mut table = MetaTable::new();
        table.insert(7, row("c"));
        table.insert(0, row("a"));
        table.insert(3, row("b"));

        let indices: Vec<u64> = table.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 3, 7]);
    }

    #[test]
    fn unaugmented_rows_refuse_frame_count() {
        let meta = row("a");
        assert!(meta.frames().is_err());
        assert!(!meta.is_augmented());
    }

    #[test]
    fn serializes_keyed_by_row_index() {
        let mut table = MetaTable::new();
        table.insert(2, row("b"));

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.starts_with("{\"2\":{"));

        let back: MetaTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
