use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use phonolab::config::PipelineConfig;
use phonolab::data::model::ClassCount;
use phonolab::data::writer::read_breaks;
use phonolab::error::{DatasetError, PipelineError, SkipReason};
use phonolab::pipeline::run;

fn config(root: &Path, k: usize) -> PipelineConfig {
    PipelineConfig::new(root, ClassCount::new(k).unwrap())
}

#[test]
fn one_to_ten_with_three_classes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "1,2,3,4,5,6,7,8,9,10,X\n").unwrap();

    let summary = run(&config(dir.path(), 3)).unwrap();

    assert_eq!(summary.processed_count(), 1);
    let done = &summary.processed[0];
    assert_eq!(done.breaks_file, dir.path().join("res").join("a.jen"));
    let breaks = read_breaks(&done.breaks_file).unwrap();
    assert_eq!(breaks.len(), 4);
    assert_relative_eq!(breaks[0], 1.0);
    assert_relative_eq!(breaks[3], 10.0);
    assert!(breaks.windows(2).all(|w| w[0] < w[1]));

    let figure = done.figure.as_ref().unwrap();
    assert_eq!(figure, &dir.path().join("figs").join("a.png"));
    assert_eq!(image::image_dimensions(figure).unwrap(), (640, 480));
}

#[test]
fn empty_root_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run(&config(dir.path(), 3)).unwrap();
    assert_eq!(summary.processed_count(), 0);
    assert_eq!(summary.skipped_count(), 0);
    assert!(!dir.path().join("res").exists());
}

#[test]
fn malformed_dataset_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.txt"), "a,b,c\n").unwrap();
    fs::write(dir.path().join("good.txt"), "4,8,15,16,23,42,X\n").unwrap();

    let summary = run(&config(dir.path(), 2).with_figures(false)).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.skipped_count(), 1);
    assert!(matches!(
        summary.skipped[0].reason,
        SkipReason::Dataset(DatasetError::Malformed { .. })
    ));
    assert!(!dir.path().join("res").join("bad.jen").exists());
    assert!(dir.path().join("res").join("good.jen").exists());
}

#[test]
fn reruns_write_identical_breaks() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("f.txt"),
        "0.1,0.25,0.3,7.7,7.9,8.15,19.5,20.125,21.0,X\n",
    )
    .unwrap();
    let jen = dir.path().join("res").join("f.jen");

    run(&config(dir.path(), 3).with_figures(false)).unwrap();
    let first = fs::read(&jen).unwrap();
    run(&config(dir.path(), 3).with_figures(false)).unwrap();
    let second = fs::read(&jen).unwrap();

    assert_eq!(first, second);
}

#[test]
fn nested_directories_get_their_own_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let female = dir.path().join("female");
    let deep = female.join("aa");
    fs::create_dir_all(&deep).unwrap();
    fs::write(female.join("iy.txt"), "1,2,3,10,11,12,X").unwrap();
    fs::write(deep.join("aa.txt"), "5,6,7,50,51,52,X").unwrap();
    fs::write(dir.path().join("notes.md"), "ignored").unwrap();

    let summary = run(&config(dir.path(), 2).with_figures(false)).unwrap();

    assert_eq!(summary.processed_count(), 2);
    assert!(female.join("res").join("iy.jen").exists());
    assert!(deep.join("res").join("aa.jen").exists());
    assert!(!dir.path().join("res").exists());
    // Files before subdirectories.
    assert_eq!(summary.processed[0].source, female.join("iy.txt"));
}

#[test]
fn output_directories_are_not_rescanned() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "1,2,3,4,X").unwrap();
    let res = dir.path().join("res");
    fs::create_dir_all(&res).unwrap();
    fs::write(res.join("stale.txt"), "not,numbers,X").unwrap();

    let summary = run(&config(dir.path(), 2).with_figures(false)).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.skipped_count(), 0);
}

#[test]
fn class_count_equal_to_len_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "3,1,2,X").unwrap();

    let summary = run(&config(dir.path(), 3).with_figures(false)).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.processed[0].breaks.len(), 4);
}

#[test]
fn missing_root_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&config(&dir.path().join("nope"), 3)).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn repeated_io_failures_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    // A plain file where the output directory should go.
    fs::write(dir.path().join("res"), "").unwrap();
    for name in ["a", "b", "c", "d"] {
        fs::write(dir.path().join(format!("{name}.txt")), "1,2,3,4,X").unwrap();
    }
    let mut config = config(dir.path(), 2).with_figures(false);
    config.max_consecutive_io_failures = 2;

    let err = run(&config).unwrap_err();

    assert!(matches!(err, PipelineError::IoEscalation { count: 2, .. }));
}

/// A directory whose datasets cannot be written: `res` is a plain file.
fn unwritable_dir(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("res"), "").unwrap();
    fs::write(dir.join("d.txt"), "1,2,3,4,X").unwrap();
}

#[test]
fn processed_dataset_resets_the_io_streak() {
    let dir = tempfile::tempdir().unwrap();
    unwritable_dir(dir.path(), "a");
    fs::create_dir_all(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("b").join("ok.txt"), "1,2,3,4,X").unwrap();
    unwritable_dir(dir.path(), "c");
    let mut config = config(dir.path(), 2).with_figures(false);
    config.max_consecutive_io_failures = 2;

    let summary = run(&config).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.skipped_count(), 2);
    assert!(summary.skipped.iter().all(|s| s.reason.is_io()));
}

#[test]
fn content_skips_do_not_reset_the_io_streak() {
    let dir = tempfile::tempdir().unwrap();
    unwritable_dir(dir.path(), "a");
    fs::create_dir_all(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("b").join("bad.txt"), "a,b,c\n").unwrap();
    fs::write(dir.path().join("b").join("short.txt"), "1,X").unwrap();
    unwritable_dir(dir.path(), "c");
    let mut config = config(dir.path(), 2).with_figures(false);
    config.max_consecutive_io_failures = 2;

    let err = run(&config).unwrap_err();

    assert!(matches!(err, PipelineError::IoEscalation { count: 2, .. }));
}

#[test]
fn undecodable_files_are_skipped_without_escalating() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c", "d", "e"] {
        fs::write(dir.path().join(format!("{name}.txt")), b"1,2,\xff\xfe,X").unwrap();
    }
    fs::write(dir.path().join("f.txt"), "1,2,3,4,X").unwrap();
    let mut config = config(dir.path(), 2).with_figures(false);
    config.max_consecutive_io_failures = 2;

    let summary = run(&config).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.skipped_count(), 5);
    assert!(summary.skipped.iter().all(|s| matches!(
        s.reason,
        SkipReason::Dataset(DatasetError::Malformed { .. })
    )));
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let dir = tempfile::tempdir().unwrap();
    let speaker = dir.path().join("spk");
    fs::create_dir_all(&speaker).unwrap();
    fs::write(speaker.join("a.txt"), "1,2,3,4,X").unwrap();
    std::os::unix::fs::symlink(dir.path(), speaker.join("loop")).unwrap();

    let summary = run(&config(dir.path(), 2).with_figures(false)).unwrap();

    assert_eq!(summary.processed_count(), 1);
    assert_eq!(summary.skipped_count(), 0);
}
