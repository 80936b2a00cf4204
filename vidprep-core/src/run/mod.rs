//! Experiment runners and evaluators.
//!
//! The training collaborators (model mathematics, optimization, metric
//! computation) live on the other side of the `Runner`/`Evaluator` seam.
//! What lives here is the harness plumbing every family shares: run
//! directory management, spec persistence, dataset and loader construction,
//! and driving every batch through the frame pipeline. The model family tag
//! selects which implementation attaches, and each family inspects its
//! batches for the inputs it needs before handing off.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::config::{CoreConfig, SplitPart};
use crate::error::{CoreError, CoreResult};
use crate::meta::MetaTable;
use crate::pipeline::{BatchLoader, VideoDataSet};
use crate::specs::{ModelFamily, RunSpec};
use crate::video::Video;

/// One training-side collaborator seam.
pub trait Runner {
    fn run(&mut self) -> CoreResult<()>;
}

/// One evaluation-side collaborator seam.
pub trait Evaluator {
    fn start(&mut self) -> CoreResult<()>;
}

/// Selects the runner implementation for a spec's model family.
pub fn runner_for(config: &CoreConfig, spec: RunSpec) -> Box<dyn Runner> {
    let harness = Harness::new(config.clone(), spec);
    match harness.spec.model.family {
        ModelFamily::Class => Box::new(ClassRunner(harness)),
        ModelFamily::Ae => Box::new(AutoEncoderRunner(harness)),
        ModelFamily::Gsnn => Box::new(GsnnRunner(harness)),
        ModelFamily::Vae => Box::new(VariationalRunner(harness)),
    }
}

/// Selects the evaluator implementation for a spec's model family.
pub fn evaluator_for(config: &CoreConfig, spec: RunSpec) -> Box<dyn Evaluator> {
    let harness = Harness::new(config.clone(), spec);
    match harness.spec.model.family {
        ModelFamily::Class => Box::new(ClassEvaluator(harness)),
        ModelFamily::Ae => Box::new(AutoEncoderEvaluator(harness)),
        ModelFamily::Gsnn => Box::new(GsnnEvaluator(harness)),
        ModelFamily::Vae => Box::new(VariationalEvaluator(harness)),
    }
}

/// Prepares the run directory and hands the spec to its family's runner.
pub fn run_experiment(config: &CoreConfig, spec: RunSpec) -> CoreResult<()> {
    let run_dir = config.run_dir(&spec.name);
    if run_dir.exists() && !spec.resume {
        return Err(CoreError::Config(format!(
            "run directory '{}' already exists; pass resume to continue it",
            run_dir.display()
        )));
    }
    fs::create_dir_all(&run_dir)?;
    spec.save(config)?;
    log::info!("Starting run '{}' ({})", spec.name, spec.model.family);
    runner_for(config, spec).run()
}

/// Hands a previously persisted spec to its family's evaluator.
pub fn evaluate_experiment(config: &CoreConfig, spec: RunSpec) -> CoreResult<()> {
    log::info!("Evaluating run '{}' ({})", spec.name, spec.model.family);
    evaluator_for(config, spec).start()
}

// ---- Shared harness plumbing ----

struct Harness {
    config: CoreConfig,
    spec: RunSpec,
}

#[derive(Debug, Default)]
struct PassStats {
    batches: usize,
    videos: usize,
    frames: usize,
}

impl Harness {
    fn new(config: CoreConfig, spec: RunSpec) -> Self {
        Harness { config, spec }
    }

    fn dataset(&self, part: SplitPart) -> CoreResult<Arc<VideoDataSet>> {
        let table = MetaTable::read(&self.config.split_meta_path(
            self.spec.set,
            self.spec.split,
            part,
        ))?;
        let opts = match part {
            SplitPart::Train => self.spec.train_data_set.clone(),
            _ => self.spec.valid_data_set.clone(),
        };
        Ok(Arc::new(VideoDataSet::new(
            &table,
            opts,
            self.config.dataset_data_root(self.spec.set),
            self.config.jpeg_root(self.spec.set),
        )?))
    }

    fn loader(&self, part: SplitPart) -> CoreResult<BatchLoader> {
        let opts = match part {
            SplitPart::Train => self.spec.train_data_loader,
            _ => self.spec.valid_data_loader,
        };
        BatchLoader::new(self.dataset(part)?, opts)
    }

    /// Drives one full pass over a loader, materializing every batch and
    /// running the family's inspection on each video.
    fn drive_pass(
        &self,
        loader: &BatchLoader,
        epoch: u64,
        inspect: &dyn Fn(&Video) -> CoreResult<()>,
    ) -> CoreResult<PassStats> {
        let mut stats = PassStats::default();
        let interval = self.spec.log_interval.max(1) as usize;
        let batches = loader.batches(epoch);
        let total = batches.len();

        for (i, batch) in batches.iter().enumerate() {
            let videos = loader.load_batch(batch)?;
            for video in &videos {
                inspect(video)?;
                stats.frames += video.frames().len();
            }
            stats.videos += videos.len();
            stats.batches += 1;
            if (i + 1) % interval == 0 {
                log::info!(
                    "[{}] epoch {} batch {}/{}",
                    self.spec.name,
                    epoch,
                    i + 1,
                    total
                );
            }
        }
        Ok(stats)
    }

    /// The epoch loop shared by every runner family.
    fn train(&self, inspect: &dyn Fn(&Video) -> CoreResult<()>) -> CoreResult<()> {
        let train_loader = self.loader(SplitPart::Train)?;
        let valid_loader = self.loader(SplitPart::Dev)?;

        for epoch in 0..self.spec.trainer.epochs as u64 {
            let started = Instant::now();
            let train_stats = self.drive_pass(&train_loader, epoch, inspect)?;
            let valid_stats = self.drive_pass(&valid_loader, epoch, inspect)?;
            log::info!(
                "[{}] epoch {} done: {} train / {} valid videos, {} frames, {:.1}s",
                self.spec.name,
                epoch,
                train_stats.videos,
                valid_stats.videos,
                train_stats.frames + valid_stats.frames,
                started.elapsed().as_secs_f64()
            );
        }
        Ok(())
    }

    /// One deterministic pass over the validation side, persisted as an
    /// evaluation report for the metric collaborators.
    fn evaluate(&self, inspect: &dyn Fn(&Video) -> CoreResult<()>) -> CoreResult<()> {
        let loader = self.loader(SplitPart::Dev)?;
        let started = Instant::now();
        let stats = self.drive_pass(&loader, 0, inspect)?;

        let report = EvalReport {
            run: &self.spec.name,
            family: self.spec.model.family,
            metrics: &self.spec.evaluator.metrics,
            batches: stats.batches,
            videos: stats.videos,
            frames: stats.frames,
            elapsed_secs: started.elapsed().as_secs_f64(),
            finished_at: chrono::Local::now().to_rfc3339(),
        };
        let path = self.config.run_dir(&self.spec.name).join("eval_report.json");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        log::info!("Wrote evaluation report to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EvalReport<'a> {
    run: &'a str,
    family: ModelFamily,
    metrics: &'a [String],
    batches: usize,
    videos: usize,
    frames: usize,
    elapsed_secs: f64,
    finished_at: String,
}

// ---- Family inspections ----

fn expect_label(video: &Video) -> CoreResult<()> {
    if video.label().is_empty() {
        return Err(CoreError::Metadata(format!(
            "video '{}' has no label",
            video.id()
        )));
    }
    Ok(())
}

fn expect_frames(video: &Video) -> CoreResult<()> {
    if video.frames().len() != video.indices().len() {
        return Err(CoreError::Decode(format!(
            "video '{}' materialized {} of {} frames",
            video.id(),
            video.frames().len(),
            video.indices().len()
        )));
    }
    Ok(())
}

pub struct ClassRunner(Harness);

impl Runner for ClassRunner {
    fn run(&mut self) -> CoreResult<()> {
        self.0.train(&|v| {
            expect_frames(v)?;
            expect_label(v)
        })
    }
}

pub struct AutoEncoderRunner(Harness);

impl Runner for AutoEncoderRunner {
    // Reconstruction needs frames only; labels may be absent.
    fn run(&mut self) -> CoreResult<()> {
        self.0.train(&expect_frames)
    }
}

pub struct GsnnRunner(Harness);

impl Runner for GsnnRunner {
    fn run(&mut self) -> CoreResult<()> {
        self.0.train(&|v| {
            expect_frames(v)?;
            expect_label(v)
        })
    }
}

pub struct VariationalRunner(Harness);

impl Runner for VariationalRunner {
    fn run(&mut self) -> CoreResult<()> {
        self.0.train(&|v| {
            expect_frames(v)?;
            expect_label(v)
        })
    }
}

pub struct ClassEvaluator(Harness);

impl Evaluator for ClassEvaluator {
    fn start(&mut self) -> CoreResult<()> {
        self.0.evaluate(&|v| {
            expect_frames(v)?;
            expect_label(v)
        })
    }
}

pub struct AutoEncoderEvaluator(Harness);

impl Evaluator for AutoEncoderEvaluator {
    fn start(&mut self) -> CoreResult<()> {
        self.0.evaluate(&expect_frames)
    }
}

pub struct GsnnEvaluator(Harness);

impl Evaluator for GsnnEvaluator {
    fn start(&mut self) -> CoreResult<()> {
        self.0.evaluate(&|v| {
            expect_frames(v)?;
            expect_label(v)
        })
    }
}

pub struct VariationalEvaluator(Harness);

impl Evaluator for VariationalEvaluator {
    fn start(&mut self) -> CoreResult<()> {
        self.0.evaluate(&|v| {
            expect_frames(v)?;
            expect_label(v)
        })
    }
}
