//! Dataset and batch loader behavior over real JPEG fixtures.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::{augmented_table, write_jpeg_frames};
use tempfile::tempdir;
use vidprep_core::pipeline::DataSetOptions;
use vidprep_core::video::frames::FrameSource;
use vidprep_core::{BatchLoader, DataLoaderOptions, Setting, VideoDataSet};

const FRAMES_PER_VIDEO: usize = 10;

fn jpeg_dataset(n: usize, setting: Setting) -> (tempfile::TempDir, Arc<VideoDataSet>) {
    let dir = tempdir().unwrap();
    let jpeg_root = dir.path().join("jpeg");
    for i in 0..n {
        write_jpeg_frames(&jpeg_root.join(format!("v{i}")), FRAMES_PER_VIDEO);
    }

    let dataset = VideoDataSet::new(
        &augmented_table(n, FRAMES_PER_VIDEO as u64),
        DataSetOptions {
            cut: 1.0,
            setting,
            num_segments: Some(4),
            segment_sample_size: Some(1),
            frame_source: FrameSource::Jpeg,
        },
        PathBuf::from("/unused"),
        jpeg_root,
    )
    .unwrap();
    (dir, Arc::new(dataset))
}

fn loader_opts(batch_size: usize, num_workers: usize) -> DataLoaderOptions {
    DataLoaderOptions {
        batch_size,
        shuffle: false,
        num_workers,
        pin_memory: false,
        drop_last: false,
    }
}

#[test]
fn fetching_materializes_the_selected_frames() {
    let (_dir, dataset) = jpeg_dataset(2, Setting::Valid);
    let mut rng = rand::thread_rng();

    let video = dataset.get(0, &mut rng).unwrap();
    assert_eq!(video.indices(), &[0, 3, 6, 9]);
    assert_eq!(video.frames().len(), 4);
    // Fixture frames encode their index in the red channel.
    assert_eq!(video.frames()[0].get_pixel(0, 0).0[0], 0);
    assert_eq!(video.to_string(), "Video v0 (4x8x8)");
}

#[test]
fn parallel_batches_come_back_in_request_order() {
    let (_dir, dataset) = jpeg_dataset(6, Setting::Valid);
    let loader = BatchLoader::new(dataset, loader_opts(6, 3)).unwrap();

    let batch = loader.batches(0).remove(0);
    let videos = loader.load_batch(&batch).unwrap();
    let ids: Vec<&str> = videos.iter().map(|v| v.id()).collect();
    assert_eq!(ids, vec!["v0", "v1", "v2", "v3", "v4", "v5"]);
    assert!(videos.iter().all(|v| v.frames().len() == 4));
}

#[test]
fn validation_loads_are_identical_across_epochs() {
    let (_dir, dataset) = jpeg_dataset(3, Setting::Valid);
    let loader = BatchLoader::new(dataset, loader_opts(3, 0)).unwrap();

    let first: Vec<Vec<usize>> = loader
        .load_batch(&loader.batches(0)[0])
        .unwrap()
        .iter()
        .map(|v| v.indices().to_vec())
        .collect();
    let second: Vec<Vec<usize>> = loader
        .load_batch(&loader.batches(1)[0])
        .unwrap()
        .iter()
        .map(|v| v.indices().to_vec())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn seeded_training_loads_are_reproducible() {
    let (_dir, dataset) = jpeg_dataset(4, Setting::Train);
    let a = BatchLoader::new(Arc::clone(&dataset), loader_opts(4, 0))
        .unwrap()
        .with_seed(13);
    let b = BatchLoader::new(dataset, loader_opts(4, 0))
        .unwrap()
        .with_seed(13);

    let indices = |loader: &BatchLoader| -> Vec<Vec<usize>> {
        loader
            .load_batch(&loader.batches(0)[0])
            .unwrap()
            .iter()
            .map(|v| v.indices().to_vec())
            .collect()
    };
    assert_eq!(indices(&a), indices(&b));
}

#[test]
fn incomplete_extraction_is_reported() {
    let dir = tempdir().unwrap();
    let jpeg_root = dir.path().join("jpeg");
    // Only half the frames the metadata promises.
    write_jpeg_frames(&jpeg_root.join("v0"), FRAMES_PER_VIDEO / 2);

    let dataset = VideoDataSet::new(
        &augmented_table(1, FRAMES_PER_VIDEO as u64),
        DataSetOptions {
            cut: 1.0,
            setting: Setting::Valid,
            num_segments: Some(2),
            segment_sample_size: Some(1),
            frame_source: FrameSource::Jpeg,
        },
        PathBuf::from("/unused"),
        jpeg_root,
    )
    .unwrap();

    let err = dataset.get(0, &mut rand::thread_rng()).unwrap_err();
    assert!(err.to_string().contains("cut at 10"));
}
