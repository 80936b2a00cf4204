//! Metadata augmentation: enrich a table with per-video technical attributes.
//!
//! Rows are probed in parallel over row batches. Every worker result carries
//! the original row index, and a single-threaded reducer applies the
//! `(index, report)` pairs back in ascending index order, so the final table
//! is independent of completion order and re-running recomputes the same
//! values.
//!
//! A probe failure is isolated to its row: the row keeps its unset
//! attributes, the failure is logged, and the caller receives the
//! `(index, error)` pair in the returned summary.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::resolve_relative;
use crate::error::CoreResult;
use crate::meta::MetaTable;
use crate::probe::{ProbeReport, VideoProber};

/// Outcome of augmenting one table.
#[derive(Debug, Default)]
pub struct AugmentSummary {
    /// Rows whose attributes were written
    pub probed: usize,
    /// Rows whose probe failed, with the rendered error
    pub failed: Vec<(u64, String)>,
}

impl AugmentSummary {
    pub fn all_failed(&self) -> bool {
        self.probed == 0 && !self.failed.is_empty()
    }
}

/// Probes every row of `table` and writes length/height/width/framerate back
/// into it. `batch_size` controls how many rows each worker takes at a time;
/// 1 gives the scheduler the most freedom. `on_row` is invoked once per
/// completed probe (for progress display) from worker threads.
pub fn augment_table(
    table: &mut MetaTable,
    data_root: &Path,
    prober: &dyn VideoProber,
    batch_size: usize,
    on_row: Option<&(dyn Fn() + Sync)>,
) -> CoreResult<AugmentSummary> {
    let entries: Vec<(u64, PathBuf)> = table
        .iter()
        .map(|(index, row)| resolve_relative(data_root, &row.video_path).map(|p| (index, p)))
        .collect::<CoreResult<_>>()?;

    let batch = batch_size.max(1);
    let mut results: Vec<(u64, Result<ProbeReport, String>)> = entries
        .par_chunks(batch)
        .flat_map_iter(|chunk| {
            chunk
                .iter()
                .map(|(index, path)| {
                    let outcome = prober.probe(path).map_err(|e| e.to_string());
                    if let Some(cb) = on_row {
                        cb();
                    }
                    (*index, outcome)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    // Single-threaded reducer: apply in index order regardless of how the
    // batches interleaved.
    results.sort_by_key(|(index, _)| *index);

    let mut summary = AugmentSummary::default();
    for (index, outcome) in results {
        match outcome {
            Ok(report) => {
                // Index came from iterating this table, the row is present.
                if let Some(row) = table.get_mut(index) {
                    row.length = Some(report.frames);
                    row.height = Some(report.height);
                    row.width = Some(report.width);
                    row.framerate = Some(report.framerate);
                    summary.probed += 1;
                }
            }
            Err(message) => {
                log::warn!("Probe failed for row {index}: {message}");
                summary.failed.push((index, message));
            }
        }
    }
    Ok(summary)
}
