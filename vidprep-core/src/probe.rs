//! FFprobe integration for per-video technical metadata.
//!
//! The augmentation stage needs frame count, dimensions, and frame rate for
//! every video in a dataset. This module provides that behind a trait so the
//! parallel augmentation path can be exercised in tests without ffprobe
//! installed; the default implementation shells out via the `ffprobe` crate.

use std::path::Path;

use ffprobe::ffprobe;

use crate::error::{CoreError, CoreResult};

/// Technical attributes of one probed video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// Total frame count
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    /// Average frame rate, rounded to the nearest integer
    pub framerate: u32,
}

/// Probing seam. Implementations must be callable from multiple rayon
/// workers at once.
pub trait VideoProber: Sync {
    fn probe(&self, path: &Path) -> CoreResult<ProbeReport>;
}

/// Probes via the `ffprobe` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeProber;

impl VideoProber for FfprobeProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeReport> {
        log::debug!("Running ffprobe on: {}", path.display());
        let metadata = ffprobe(path)
            .map_err(|e| CoreError::probe(path.display(), format!("ffprobe failed: {e:?}")))?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| CoreError::probe(path.display(), "no video stream found"))?;

        let width = video_stream
            .width
            .filter(|w| *w > 0)
            .ok_or_else(|| CoreError::probe(path.display(), "video stream missing width"))?;
        let height = video_stream
            .height
            .filter(|h| *h > 0)
            .ok_or_else(|| CoreError::probe(path.display(), "video stream missing height"))?;

        let rate = parse_frame_rate(&video_stream.avg_frame_rate)
            .filter(|r| *r > 0.0)
            .ok_or_else(|| {
                CoreError::probe(
                    path.display(),
                    format!(
                        "unparsable avg_frame_rate '{}'",
                        video_stream.avg_frame_rate
                    ),
                )
            })?;

        // nb_frames is container-dependent; fall back to duration * rate.
        let frames = match video_stream
            .nb_frames
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(n) if n > 0 => n,
            _ => {
                let duration = video_stream
                    .duration
                    .as_deref()
                    .or(metadata.format.duration.as_deref())
                    .and_then(|d| d.parse::<f64>().ok())
                    .filter(|d| *d > 0.0)
                    .ok_or_else(|| {
                        CoreError::probe(path.display(), "no frame count and no duration")
                    })?;
                (duration * rate).round() as u64
            }
        };

        Ok(ProbeReport {
            frames,
            width: width as u32,
            height: height as u32,
            framerate: rate.round() as u32,
        })
    }
}

/// Parse a frame rate string (e.g. "30000/1001" or "30.0").
fn parse_frame_rate(frame_rate_str: &str) -> Option<f64> {
    if let Some((num, den)) = frame_rate_str.split_once('/') {
        let numerator: f64 = num.trim().parse().ok()?;
        let denominator: f64 = den.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }
    frame_rate_str.trim().parse().ok()
}
