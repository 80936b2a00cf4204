//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::path::Path;

use vidprep_core::{CoreResult, MetaTable, ProbeReport, VideoMeta, VideoProber};

/// Deterministic prober: every video reports the same technical attributes,
/// and any path containing "bad" fails, so per-row isolation is testable
/// without ffprobe installed.
pub struct StubProber {
    pub frames: u64,
}

impl VideoProber for StubProber {
    fn probe(&self, path: &Path) -> CoreResult<ProbeReport> {
        if path.to_string_lossy().contains("bad") {
            return Err(vidprep_core::CoreError::Probe {
                path: path.display().to_string(),
                message: "stub failure".to_string(),
            });
        }
        Ok(ProbeReport {
            frames: self.frames,
            width: 176,
            height: 100,
            framerate: 12,
        })
    }
}

pub fn meta_row(id: &str, label: &str) -> VideoMeta {
    VideoMeta {
        id: id.to_string(),
        label: label.to_string(),
        video_path: format!("videos/{id}.webm"),
        jpeg_path: id.to_string(),
        length: None,
        height: None,
        width: None,
        framerate: None,
    }
}

/// A table of `n` rows cycling over three labels.
pub fn small_table(n: usize) -> MetaTable {
    let labels = ["waving", "pointing", "dropping"];
    (0..n)
        .map(|i| (i as u64, meta_row(&format!("v{i}"), labels[i % labels.len()])))
        .collect()
}

/// A table whose rows already carry probed attributes, as if augmentation
/// had run with `frames` per video.
pub fn augmented_table(n: usize, frames: u64) -> MetaTable {
    small_table(n)
        .iter()
        .map(|(i, row)| {
            let mut row = row.clone();
            row.length = Some(frames);
            row.height = Some(100);
            row.width = Some(176);
            row.framerate = Some(12);
            (i, row)
        })
        .collect()
}

/// Writes `count` tiny JPEG frames into `dir`, named in sortable order.
pub fn write_jpeg_frames(dir: &Path, count: usize) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let frame = image::RgbImage::from_pixel(8, 8, image::Rgb([i as u8, 0, 0]));
        frame.save(dir.join(format!("{i:05}.jpeg"))).unwrap();
    }
}
