//! Dataset and batch loading pipeline.
//!
//! `VideoDataSet` binds a metadata table to sampling options and knows how
//! to construct the `Video` for any row. `BatchLoader` walks the dataset in
//! batches, optionally shuffled, materializing every video of a batch in
//! parallel on its own worker pool. Each fetch constructs a fresh `Video`
//! with no shared mutable state, so workers never need locking.

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::resolve_relative;
use crate::error::{CoreError, CoreResult};
use crate::meta::MetaTable;
use crate::video::frames::FrameSource;
use crate::video::{Setting, Video};

/// Options shared by every dataset of a data bunch. Carried opaquely for
/// downstream consumers that build tensors from the loaded frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataBunchOptions {
    /// Square side length frames are resized to downstream
    pub frame_size: u32,
}

/// Per-dataset sampling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetOptions {
    /// Fraction of each video to consider, in `[0, 1]`
    pub cut: f64,
    pub setting: Setting,
    #[serde(default)]
    pub num_segments: Option<usize>,
    #[serde(default)]
    pub segment_sample_size: Option<usize>,
    pub frame_source: FrameSource,
}

impl DataSetOptions {
    /// The `(num_segments, segment_sample_size)` pair, enforcing that both
    /// are given or neither is.
    pub fn segments(&self) -> CoreResult<Option<(usize, usize)>> {
        match (self.num_segments, self.segment_sample_size) {
            (Some(n), Some(s)) => Ok(Some((n, s))),
            (None, None) => Ok(None),
            _ => Err(CoreError::Validation(
                "specify both number of segments and segment sample size".to_string(),
            )),
        }
    }
}

/// Batch iteration options. `pin_memory` is carried opaquely for the tensor
/// framework on the other side of the seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLoaderOptions {
    pub batch_size: usize,
    pub shuffle: bool,
    /// Worker threads for frame materialization; 0 loads on the caller
    pub num_workers: usize,
    pub pin_memory: bool,
    pub drop_last: bool,
}

/// A metadata table bound to sampling options and frame roots.
#[derive(Debug, Clone)]
pub struct VideoDataSet {
    rows: Vec<Arc<crate::meta::VideoMeta>>,
    opts: DataSetOptions,
    /// Root that container paths resolve against
    video_root: PathBuf,
    /// Root that extracted-frame directories resolve against
    jpeg_root: PathBuf,
}

impl VideoDataSet {
    pub fn new(
        table: &MetaTable,
        opts: DataSetOptions,
        video_root: PathBuf,
        jpeg_root: PathBuf,
    ) -> CoreResult<Self> {
        if table.is_empty() {
            return Err(CoreError::NoRowsFound(
                "dataset metadata table is empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&opts.cut) {
            return Err(CoreError::Validation(format!(
                "cut should be a value between 0.0 and 1.0, got {}",
                opts.cut
            )));
        }
        // Fail mismatched segment parameters at construction, not per item.
        opts.segments()?;

        Ok(VideoDataSet {
            rows: table.iter().map(|(_, row)| Arc::new(row.clone())).collect(),
            opts,
            video_root,
            jpeg_root,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn options(&self) -> &DataSetOptions {
        &self.opts
    }

    /// Constructs the `Video` for row `i` without touching pixel data.
    pub fn sample<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> CoreResult<Video> {
        let meta = self
            .rows
            .get(i)
            .ok_or_else(|| CoreError::Validation(format!("dataset row {i} out of range")))?;
        Video::new(
            Arc::clone(meta),
            self.opts.cut,
            self.opts.setting,
            self.opts.segments()?,
            rng,
        )
    }

    /// Constructs and materializes the `Video` for row `i`.
    pub fn get<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> CoreResult<Video> {
        let mut video = self.sample(i, rng)?;
        match self.opts.frame_source {
            FrameSource::Jpeg => {
                let dir = resolve_relative(&self.jpeg_root, &video.meta().jpeg_path)?;
                video.load_jpeg(&dir)?;
            }
            FrameSource::Container => {
                let path = resolve_relative(&self.video_root, &video.meta().video_path)?;
                video.load_container(&path)?;
            }
        }
        Ok(video)
    }
}

/// Iterates a dataset in batches on a dedicated worker pool.
pub struct BatchLoader {
    dataset: Arc<VideoDataSet>,
    opts: DataLoaderOptions,
    pool: Option<rayon::ThreadPool>,
    seed: Option<u64>,
}

impl BatchLoader {
    pub fn new(dataset: Arc<VideoDataSet>, opts: DataLoaderOptions) -> CoreResult<Self> {
        if opts.batch_size == 0 {
            return Err(CoreError::Validation(
                "batch size must be positive".to_string(),
            ));
        }
        let pool = if opts.num_workers > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(opts.num_workers)
                    .build()
                    .map_err(|e| {
                        CoreError::Config(format!("failed to build loader pool: {e}"))
                    })?,
            )
        } else {
            None
        };
        Ok(BatchLoader {
            dataset,
            opts,
            pool,
            seed: None,
        })
    }

    /// Pins shuffle order and per-item sampling to a seed, making epochs
    /// reproducible run-to-run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Row-index batches for one epoch, in iteration order.
    pub fn batches(&self, epoch: u64) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.opts.shuffle {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(epoch)),
                None => StdRng::from_entropy(),
            };
            order.shuffle(&mut rng);
        }
        let mut batches: Vec<Vec<usize>> = order
            .chunks(self.opts.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        if self.opts.drop_last {
            if let Some(last) = batches.last() {
                if last.len() < self.opts.batch_size {
                    batches.pop();
                }
            }
        }
        batches
    }

    pub fn num_batches(&self) -> usize {
        let n = self.dataset.len();
        if self.opts.drop_last {
            n / self.opts.batch_size
        } else {
            n.div_ceil(self.opts.batch_size)
        }
    }

    /// Materializes one batch, in parallel when workers are configured.
    /// Order of the returned videos matches the order of `batch`.
    pub fn load_batch(&self, batch: &[usize]) -> CoreResult<Vec<Video>> {
        let load = |&i: &usize| -> CoreResult<Video> {
            let mut rng = self.item_rng(i);
            self.dataset.get(i, &mut rng)
        };
        match &self.pool {
            Some(pool) => pool.install(|| batch.par_iter().map(load).collect()),
            None => batch.iter().map(load).collect(),
        }
    }

    fn item_rng(&self, i: usize) -> StdRng {
        match self.seed {
            // Decorrelate rows with an odd multiplier; row 0 must not share
            // the shuffle stream.
            Some(seed) => StdRng::seed_from_u64(
                seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1),
            ),
            None => StdRng::from_entropy(),
        }
    }
}
