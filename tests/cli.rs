use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn jenks_reports_summary_on_empty_root() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("jenks")
        .unwrap()
        .args(["3", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing Jenks with 3 breaks"))
        .stdout(predicate::str::contains("processed 0 dataset(s), skipped 0"));
}

#[test]
fn jenks_skips_malformed_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.txt"), "a,b,c\n").unwrap();
    fs::write(dir.path().join("ok.txt"), "1,2,3,4,5,6,7,8,9,10,X\n").unwrap();

    Command::cargo_bin("jenks")
        .unwrap()
        .args(["3", "--no-figures", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("processed 1 dataset(s), skipped 1"));

    let jen = fs::read_to_string(dir.path().join("res").join("ok.jen")).unwrap();
    assert_eq!(jen.lines().count(), 4);
}

#[test]
fn jenks_rejects_zero_classes() {
    Command::cargo_bin("jenks")
        .unwrap()
        .arg("0")
        .assert()
        .code(2);
}

#[test]
fn jenks_rejects_non_integer_classes() {
    Command::cargo_bin("jenks")
        .unwrap()
        .arg("three")
        .assert()
        .code(2);
}

#[test]
fn jenks_fails_on_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("jenks")
        .unwrap()
        .args(["3", "--root"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn confusion_renders_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let matrix = dir.path().join("confusion_matrix.txt");
    fs::write(&matrix, "aa | 9 | 1 |\niy | 2 | 8 |\n").unwrap();

    Command::cargo_bin("confusion")
        .unwrap()
        .arg(&matrix)
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall accuracy: 85.00%"));

    assert!(dir.path().join("figs").join("confusion_matrix.png").exists());
}

#[test]
fn confusion_rejects_ragged_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let matrix = dir.path().join("m.txt");
    fs::write(&matrix, "aa | 9 | 1 |\niy | 2 |\n").unwrap();

    Command::cargo_bin("confusion")
        .unwrap()
        .arg(&matrix)
        .assert()
        .failure();
}

#[test]
fn generated_sample_runs_through_jenks() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data");

    Command::cargo_bin("generate_sample")
        .unwrap()
        .arg(&root)
        .args(["--values", "40"])
        .assert()
        .success();

    Command::cargo_bin("jenks")
        .unwrap()
        .args(["4", "--no-figures", "--root"])
        .arg(root.join("jenks"))
        .assert()
        .success()
        .stdout(predicate::str::contains("processed 12 dataset(s), skipped 0"));

    assert!(root.join("jenks").join("female").join("res").join("aa.jen").exists());
    assert!(!root.join("jenks").join("confusion_matrix.txt").exists());

    Command::cargo_bin("confusion")
        .unwrap()
        .arg(root.join("confusion_matrix.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4x4 heatmap"));
}

#[test]
fn pca_writes_its_tables() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("PCA_Data");
    std::fs::create_dir(&data).unwrap();
    let mut text = String::new();
    for (k, label) in ["aa", "iy"].iter().enumerate() {
        for i in 0..10 {
            let x = k as f64 * 5.0 + (i as f64 * 0.7).sin();
            text.push_str(&format!("{x},{},{},{label}\n", -x, i as f64 * 0.1));
        }
    }
    std::fs::write(data.join("frames.txt"), text).unwrap();
    let out = dir.path().join("res");

    Command::cargo_bin("pca")
        .unwrap()
        .arg(&data)
        .args(["--clusters", "4", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 20 rows of 3 coefficients"))
        .stdout(predicate::str::contains("PC1:"));

    for name in ["loadings.org", "kmeans.org", "weights.org", "constants.org"] {
        assert!(out.join(name).exists(), "{name} missing");
    }
}

#[test]
fn pca_without_data_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("pca")
        .unwrap()
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no feature rows"));
}
