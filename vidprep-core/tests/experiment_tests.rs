//! End-to-end experiment flow: preprocess, run, evaluate.
//!
//! Uses the JPEG frame source and a stub prober so the whole flow exercises
//! the real pipeline without ffmpeg or ffprobe installed.

mod common;

use common::{small_table, write_jpeg_frames, StubProber};
use tempfile::tempdir;
use vidprep_core::specs::registry;
use vidprep_core::{prepro, run, CoreConfig, CoreError, DatasetTag, RunSpec};

const VIDEOS: usize = 6;
const FRAMES_PER_VIDEO: usize = 8;

fn prepared_config() -> (tempfile::TempDir, CoreConfig) {
    let dir = tempdir().unwrap();
    let config = CoreConfig::new(dir.path().join("data"), dir.path().join("work"));

    small_table(VIDEOS)
        .write(&config.full_meta_path(DatasetTag::Smth))
        .unwrap();
    for i in 0..VIDEOS {
        write_jpeg_frames(
            &config.jpeg_root(DatasetTag::Smth).join(format!("v{i}")),
            FRAMES_PER_VIDEO,
        );
    }

    prepro::setup(&config, DatasetTag::Smth).unwrap();
    prepro::split_train_dev(&config, DatasetTag::Smth, 1).unwrap();
    prepro::augment_meta(
        &config,
        DatasetTag::Smth,
        1,
        &StubProber {
            frames: FRAMES_PER_VIDEO as u64,
        },
    )
    .unwrap();
    (dir, config)
}

#[test]
fn run_then_evaluate_produces_spec_and_report() {
    let (_dir, config) = prepared_config();
    let spec = registry::build_spec("dev_tadn_smth").unwrap();
    let name = spec.name.clone();

    run::run_experiment(&config, spec).unwrap();
    assert!(config.spec_path(&name).is_file());

    let reloaded = RunSpec::load(&config, &name).unwrap();
    run::evaluate_experiment(&config, reloaded).unwrap();

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.run_dir(&name).join("eval_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["run"], "dev_tadn_smth");
    assert_eq!(report["family"], "ae");
    assert_eq!(report["videos"], 1); // the dev partition of six rows
    assert!(report["metrics"]
        .as_array()
        .unwrap()
        .contains(&serde_json::Value::from("acc@1")));
}

#[test]
fn an_existing_run_directory_requires_resume() {
    let (_dir, config) = prepared_config();
    run::run_experiment(&config, registry::build_spec("dev_tadn_smth").unwrap()).unwrap();

    let again = registry::build_spec("dev_tadn_smth").unwrap();
    let err = run::run_experiment(&config, again).unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));

    let mut resumed = registry::build_spec("dev_tadn_smth").unwrap();
    resumed.resume = true;
    run::run_experiment(&config, resumed).unwrap();
}

#[test]
fn every_model_family_has_a_runner_and_evaluator() {
    let (_dir, config) = prepared_config();
    use vidprep_core::specs::ModelFamily;

    for family in [
        ModelFamily::Class,
        ModelFamily::Ae,
        ModelFamily::Gsnn,
        ModelFamily::Vae,
    ] {
        let mut spec = registry::build_spec("dev_tadn_smth").unwrap();
        spec.name = format!("family_{family}");
        spec.model.family = family;
        spec.trainer.epochs = 1;
        run::run_experiment(&config, spec.clone()).unwrap();
        run::evaluate_experiment(&config, spec).unwrap();
    }
}
