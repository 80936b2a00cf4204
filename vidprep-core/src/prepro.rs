//! Dataset preprocessing operations.
//!
//! These are the implementations behind the `setup`, `select-subset`, and
//! `prepro-set` jobs: work-root layout creation, label subset selection,
//! deterministic train/dev/test splitting, metadata augmentation over all
//! splits, per-split statistics, and JPEG frame extraction.

use std::collections::BTreeMap;
use std::fs;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::{resolve_relative, CoreConfig, SplitPart};
use crate::error::{CoreError, CoreResult};
use crate::jobs::{DatasetTag, PreproSetOptions, SelectSubsetOptions};
use crate::meta::augment::{augment_table, AugmentSummary};
use crate::meta::{MetaTable, VideoMeta};
use crate::probe::VideoProber;

/// Fraction of rows assigned to the train partition; dev takes
/// `DEV_FRACTION` and test the remainder.
const TRAIN_FRACTION: f64 = 0.8;
const DEV_FRACTION: f64 = 0.1;

/// Rows per augmentation batch handed to one worker at a time.
const AUGMENT_BATCH_SIZE: usize = 1;

/// Creates the work-root layout for a dataset and verifies its raw data.
pub fn setup(config: &CoreConfig, set: DatasetTag) -> CoreResult<()> {
    config.validate()?;
    let data_root = config.dataset_data_root(set);
    if !data_root.is_dir() {
        return Err(CoreError::InvalidPath(format!(
            "dataset root '{}' is not a directory",
            data_root.display()
        )));
    }
    let full_meta = config.full_meta_path(set);
    if !full_meta.is_file() {
        return Err(CoreError::Metadata(format!(
            "missing upstream metadata table at '{}'",
            full_meta.display()
        )));
    }

    for dir in [
        config.meta_dir(set),
        config.jpeg_root(set),
        config.stats_dir(set),
        config.runs_dir(),
    ] {
        fs::create_dir_all(&dir)?;
    }
    log::info!(
        "Set up work root for {} at {}",
        set,
        config.dataset_work_root(set).display()
    );
    Ok(())
}

/// Restricts the full metadata table to the N most frequent labels and
/// persists the subset, preserving original row indices.
pub fn select_subset(config: &CoreConfig, opts: &SelectSubsetOptions) -> CoreResult<()> {
    if opts.num_classes == 0 {
        return Err(CoreError::Validation(
            "subset selection needs at least one class".to_string(),
        ));
    }
    let table = MetaTable::read(&config.full_meta_path(opts.set))?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, row) in table.iter() {
        *counts.entry(row.label.as_str()).or_default() += 1;
    }
    // Most frequent first; ties broken by label so reruns pick the same set.
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let kept: Vec<&str> = ranked
        .iter()
        .take(opts.num_classes)
        .map(|(label, _)| *label)
        .collect();

    let subset: MetaTable = table
        .iter()
        .filter(|(_, row)| kept.contains(&row.label.as_str()))
        .map(|(index, row)| (index, row.clone()))
        .collect();
    log::info!(
        "Selected {} of {} rows across {} labels",
        subset.len(),
        table.len(),
        kept.len()
    );
    subset.write(&config.subset_meta_path(opts.set))
}

/// Deterministically shuffles the source table into train/dev/test
/// partitions for one numbered split and persists all three.
///
/// The split number seeds the shuffle, so split 1 always produces the same
/// partitions while split 2 produces different ones.
pub fn split_train_dev(config: &CoreConfig, set: DatasetTag, split: u32) -> CoreResult<()> {
    let subset_path = config.subset_meta_path(set);
    let source = if subset_path.is_file() {
        MetaTable::read(&subset_path)?
    } else {
        MetaTable::read(&config.full_meta_path(set))?
    };
    if source.is_empty() {
        return Err(CoreError::NoRowsFound(
            config.full_meta_path(set).display().to_string(),
        ));
    }

    let mut rows: Vec<(u64, VideoMeta)> =
        source.iter().map(|(i, row)| (i, row.clone())).collect();
    let mut rng = StdRng::seed_from_u64(split as u64);
    rows.shuffle(&mut rng);

    let n = rows.len();
    let train_end = (n as f64 * TRAIN_FRACTION).round() as usize;
    let dev_end = (train_end + (n as f64 * DEV_FRACTION).round() as usize).min(n);
    let parts = [
        (SplitPart::Train, &rows[..train_end]),
        (SplitPart::Dev, &rows[train_end..dev_end]),
        (SplitPart::Test, &rows[dev_end..]),
    ];

    for (part, part_rows) in parts {
        let table: MetaTable = part_rows.iter().cloned().collect();
        log::info!("Split {split} {part:?}: {} rows", table.len());
        table.write(&config.split_meta_path(set, split, part))?;
    }
    Ok(())
}

/// Augments the metadata of all three partitions of one split, persisting
/// each augmented table back to the work root.
///
/// Per-row probe failures are isolated and reported in the summaries; a
/// partition where every probe failed aborts the run, since nothing
/// downstream could use it.
pub fn augment_meta(
    config: &CoreConfig,
    set: DatasetTag,
    split: u32,
    prober: &dyn VideoProber,
) -> CoreResult<Vec<(SplitPart, AugmentSummary)>> {
    let data_root = config.dataset_data_root(set);
    let mut summaries = Vec::new();

    for part in SplitPart::ALL {
        let path = config.split_meta_path(set, split, part);
        log::info!("Augmenting metadata at {}...", path.display());
        let mut table = MetaTable::read(&path)?;

        let bar = progress_bar(table.len() as u64, &format!("probe {}", part.as_str()));
        let tick = || bar.inc(1);
        let summary = augment_table(
            &mut table,
            &data_root,
            prober,
            AUGMENT_BATCH_SIZE,
            Some(&tick),
        )?;
        bar.finish_and_clear();

        if summary.all_failed() {
            return Err(CoreError::Metadata(format!(
                "every probe failed for '{}'",
                path.display()
            )));
        }
        if !summary.failed.is_empty() {
            log::warn!(
                "{} of {} probes failed for {} {:?}",
                summary.failed.len(),
                table.len(),
                set,
                part
            );
        }
        table.write(&path)?;
        log::info!("...done ({} rows probed)", summary.probed);
        summaries.push((part, summary));
    }
    Ok(summaries)
}

#[derive(Debug, Serialize)]
struct PartStats {
    rows: usize,
    labels: usize,
    min_length: Option<u64>,
    mean_length: Option<f64>,
    max_length: Option<u64>,
}

/// Computes per-partition row/label/length statistics and persists them as
/// one JSON document per split. Length statistics cover augmented rows only.
pub fn gather_stats(config: &CoreConfig, set: DatasetTag, split: u32) -> CoreResult<()> {
    let mut stats: BTreeMap<&str, PartStats> = BTreeMap::new();
    for part in SplitPart::ALL {
        let table = MetaTable::read(&config.split_meta_path(set, split, part))?;
        let labels: std::collections::BTreeSet<&str> =
            table.iter().map(|(_, row)| row.label.as_str()).collect();
        let lengths: Vec<u64> = table.iter().filter_map(|(_, row)| row.length).collect();
        stats.insert(
            part.as_str(),
            PartStats {
                rows: table.len(),
                labels: labels.len(),
                min_length: lengths.iter().min().copied(),
                mean_length: (!lengths.is_empty())
                    .then(|| lengths.iter().sum::<u64>() as f64 / lengths.len() as f64),
                max_length: lengths.iter().max().copied(),
            },
        );
    }

    let path = config.stats_path(set, split);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(&stats)?)?;
    log::info!("Wrote split statistics to {}", path.display());
    Ok(())
}

/// Extracts every video of the split into a per-video JPEG frame directory,
/// skipping videos that already have one.
pub fn extract_jpeg(config: &CoreConfig, set: DatasetTag, split: u32) -> CoreResult<()> {
    let data_root = config.dataset_data_root(set);
    let jpeg_root = config.jpeg_root(set);

    for part in SplitPart::ALL {
        let table = MetaTable::read(&config.split_meta_path(set, split, part))?;
        let bar = progress_bar(table.len() as u64, &format!("extract {}", part.as_str()));
        for (_, row) in table.iter() {
            let src = resolve_relative(&data_root, &row.video_path)?;
            let dst = resolve_relative(&jpeg_root, &row.jpeg_path)?;
            if dst.is_dir() && fs::read_dir(&dst)?.next().is_some() {
                log::debug!("Frames already extracted for '{}', skipping", row.id);
                bar.inc(1);
                continue;
            }
            fs::create_dir_all(&dst)?;
            extract_one(&src, &dst)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
        log::info!("Extracted frames for {} {:?}", set, part);
    }
    Ok(())
}

fn extract_one(src: &std::path::Path, dst: &std::path::Path) -> CoreResult<()> {
    let pattern = dst.join("%05d.jpeg");
    let mut child = FfmpegCommand::new()
        .hide_banner()
        .overwrite()
        .input(src.to_string_lossy().into_owned())
        .args(["-qscale:v", "2"])
        .output(pattern.to_string_lossy().into_owned())
        .spawn()
        .map_err(|e| {
            CoreError::CommandExecution(format!(
                "failed to spawn ffmpeg for '{}': {}",
                src.display(),
                e
            ))
        })?;

    let iterator = child.iter().map_err(|e| {
        CoreError::CommandExecution(format!(
            "failed to read ffmpeg output for '{}': {}",
            src.display(),
            e
        ))
    })?;
    for event in iterator {
        if let FfmpegEvent::Error(message) = event {
            return Err(CoreError::CommandExecution(format!(
                "ffmpeg failed extracting '{}': {}",
                src.display(),
                message
            )));
        }
    }
    Ok(())
}

/// Runs the full preprocessing pipeline for one split: partition, augment,
/// gather statistics, and optionally extract JPEG frames.
pub fn prepro_set(
    config: &CoreConfig,
    opts: &PreproSetOptions,
    prober: &dyn VideoProber,
) -> CoreResult<()> {
    split_train_dev(config, opts.set, opts.split)?;
    augment_meta(config, opts.set, opts.split, prober)?;
    gather_stats(config, opts.set, opts.split)?;
    if opts.jpeg {
        extract_jpeg(config, opts.set, opts.split)?;
    }
    Ok(())
}

fn progress_bar(len: u64, prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{prefix:>16} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(prefix.to_string());
    bar
}
