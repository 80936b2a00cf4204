//! The per-sample video entity.
//!
//! A `Video` is constructed for one metadata row at batch-fetch time: it
//! validates its arguments, applies the temporal cut, selects frame indices
//! (through the segment sampler when segment parameters are supplied), and
//! materializes the selected frames from one of the frame sources. Instances
//! own their data exclusively and are discarded after tensor conversion by
//! downstream consumers, so constructing them from any number of worker
//! threads is safe.

pub mod frames;
pub mod sampler;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use image::RgbImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::meta::VideoMeta;
use sampler::SegmentSampler;

/// Sampling mode: random draws for training, fixed intervals for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setting {
    Train,
    Valid,
}

impl Setting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Setting::Train => "train",
            Setting::Valid => "valid",
        }
    }
}

impl FromStr for Setting {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "train" => Ok(Setting::Train),
            "valid" => Ok(Setting::Valid),
            other => Err(CoreError::Validation(format!(
                "setting should be either \"train\" or \"valid\", got \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One video sample: a cut of the source video with its selected frame
/// indices and, once loaded, the frame data itself.
#[derive(Debug, Clone)]
pub struct Video {
    meta: Arc<VideoMeta>,
    cut: usize,
    setting: Setting,
    indices: Vec<usize>,
    data: Vec<RgbImage>,
}

impl Video {
    /// Validates the arguments and selects frame indices.
    ///
    /// `cut` is the fraction of the video to consider; the cut length is
    /// `round(length * cut)`. When `segments` is supplied, its
    /// `(num_segments, segment_sample_size)` pair drives the segment
    /// sampler in the mode given by `setting`; the segment count is clamped
    /// to the cut length first. Without segment parameters the full cut
    /// range is selected.
    pub fn new<R: Rng + ?Sized>(
        meta: Arc<VideoMeta>,
        cut: f64,
        setting: Setting,
        segments: Option<(usize, usize)>,
        rng: &mut R,
    ) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&cut) {
            return Err(CoreError::Validation(format!(
                "cut should be a value between 0.0 and 1.0, got {cut}"
            )));
        }
        let length = meta.frames()?;
        let cut_len = (length as f64 * cut).round() as usize;

        let indices = match segments {
            Some((num_segments, segment_size)) => {
                let clamped = num_segments.min(cut_len.max(1));
                let sampler = SegmentSampler::new(clamped, segment_size)?;
                match setting {
                    Setting::Train => sampler.sample_random(cut_len, rng),
                    Setting::Valid => sampler.sample_fixed(cut_len),
                }
            }
            None => (0..cut_len).collect(),
        };

        Ok(Video {
            meta,
            cut: cut_len,
            setting,
            indices,
            data: Vec::new(),
        })
    }

    pub fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn label(&self) -> &str {
        &self.meta.label
    }

    /// The cut length in frames.
    pub fn cut(&self) -> usize {
        self.cut
    }

    pub fn setting(&self) -> Setting {
        self.setting
    }

    /// Selected frame positions, in segment order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Materialized frames; empty until one of the load methods ran.
    pub fn frames(&self) -> &[RgbImage] {
        &self.data
    }

    pub fn is_loaded(&self) -> bool {
        !self.data.is_empty() || self.indices.is_empty()
    }

    /// Materializes the selected frames from an extracted-frames directory.
    ///
    /// The directory must hold at least `cut` frame images; an incomplete
    /// extraction is reported rather than silently resampled.
    pub fn load_jpeg(&mut self, jpeg_dir: &Path) -> CoreResult<()> {
        if self.indices.is_empty() {
            return Ok(());
        }
        let files = frames::list_frame_files(jpeg_dir)?;
        if files.len() < self.cut {
            return Err(CoreError::Decode(format!(
                "'{}' holds {} frames but video '{}' is cut at {}",
                jpeg_dir.display(),
                files.len(),
                self.meta.id,
                self.cut
            )));
        }
        let selected: Vec<&std::path::PathBuf> =
            self.indices.iter().map(|&i| &files[i]).collect();
        self.data = frames::load_jpeg_frames(&selected)?;
        Ok(())
    }

    /// Materializes the selected frames by decoding the container file up to
    /// the cut.
    pub fn load_container(&mut self, video_path: &Path) -> CoreResult<()> {
        if self.indices.is_empty() {
            return Ok(());
        }
        let decoded = frames::decode_container_frames(video_path, self.cut)?;
        self.data = self
            .indices
            .iter()
            .map(|&i| {
                decoded.get(i).cloned().ok_or_else(|| {
                    CoreError::Decode(format!(
                        "'{}' decoded only {} of {} cut frames",
                        video_path.display(),
                        decoded.len(),
                        self.cut
                    ))
                })
            })
            .collect::<CoreResult<_>>()?;
        Ok(())
    }
}

impl fmt::Display for Video {
    /// Representation as `Video <id> (<frames>x<width>x<height>)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.first() {
            Some(frame) => write!(
                f,
                "Video {} ({}x{}x{})",
                self.meta.id,
                self.data.len(),
                frame.width(),
                frame.height()
            ),
            None => write!(f, "Video {} ({} indices)", self.meta.id, self.indices.len()),
        }
    }
}
