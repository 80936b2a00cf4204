//! Frame sources: extracted JPEG directories and container decode.
//!
//! A video's pixel data comes either from a directory of individually
//! extracted frame images (indexed by sorted filename) or from the container
//! file itself, decoded lazily up to the cut via ffmpeg. Either way each
//! selected frame ends up as an in-memory RGB image; nothing is cached
//! across `Video` instances.

use std::fs;
use std::path::{Path, PathBuf};

use ffmpeg_sidecar::command::FfmpegCommand;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Which storage form a dataset's pixel data is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSource {
    /// Per-video directories of extracted frame images
    Jpeg,
    /// The original container file, decoded on demand
    Container,
}

/// Lists the frame images of an extracted directory, sorted by filename.
///
/// Frame files are written with zero-padded numeric names, so lexicographic
/// order is temporal order.
pub fn list_frame_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|e| {
        CoreError::Decode(format!(
            "failed to read frame directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if !path.is_file() {
                return None;
            }
            path.extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| ext.eq_ignore_ascii_case("jpeg") || ext.eq_ignore_ascii_case("jpg"))
                .map(|_| path.clone())
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::Decode(format!(
            "no frame images in '{}'",
            dir.display()
        )));
    }
    files.sort();
    Ok(files)
}

/// Loads the given frame images into RGB buffers.
pub fn load_jpeg_frames(paths: &[&PathBuf]) -> CoreResult<Vec<RgbImage>> {
    paths
        .iter()
        .map(|path| Ok(image::open(path)?.to_rgb8()))
        .collect()
}

/// Decodes up to `cut` leading frames of a container file as RGB buffers.
pub fn decode_container_frames(path: &Path, cut: usize) -> CoreResult<Vec<RgbImage>> {
    log::debug!(
        "Decoding {} leading frames from {}",
        cut,
        path.display()
    );

    let mut child = FfmpegCommand::new()
        .hide_banner()
        .input(path.to_string_lossy().into_owned())
        .frames(cut as u32)
        .rawvideo()
        .spawn()
        .map_err(|e| {
            CoreError::CommandExecution(format!(
                "failed to spawn ffmpeg for '{}': {}",
                path.display(),
                e
            ))
        })?;

    let iterator = child.iter().map_err(|e| {
        CoreError::CommandExecution(format!(
            "failed to read ffmpeg output for '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut frames = Vec::with_capacity(cut);
    for frame in iterator.filter_frames() {
        let image = RgbImage::from_raw(frame.width, frame.height, frame.data).ok_or_else(|| {
            CoreError::Decode(format!(
                "frame {} of '{}' has a short pixel buffer",
                frame.frame_num,
                path.display()
            ))
        })?;
        frames.push(image);
        if frames.len() == cut {
            break;
        }
    }

    if frames.is_empty() && cut > 0 {
        return Err(CoreError::Decode(format!(
            "ffmpeg produced no frames for '{}'",
            path.display()
        )));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn listing_sorts_by_filename_and_skips_other_files() {
        let dir = tempdir().unwrap();
        for name in ["00002.jpeg", "00000.jpeg", "00001.JPG", "meta.json"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = list_frame_files(dir.path()).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["00000.jpeg", "00001.JPG", "00002.jpeg"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(list_frame_files(dir.path()).is_err());
    }
}
