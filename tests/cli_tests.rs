use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn tidyfile(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tidyfile"))
        .args(args)
        .env_remove("TIDYFILE_LOG")
        .output()
        .expect("failed to run tidyfile")
}

fn json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn build_scenario(root: &Path) {
    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("a/report.pdf"), [7u8; 500]).unwrap();
    fs::write(root.join("a/copy_of_report.pdf"), [7u8; 500]).unwrap();
    fs::write(root.join("b/photo.jpg"), [1u8; 200]).unwrap();
}

#[test]
fn test_scan_json_summary() {
    let temp = TempDir::new().unwrap();
    build_scenario(temp.path());

    let report = json(&tidyfile(&["scan", temp.path().to_str().unwrap(), "--format", "json"]));
    assert_eq!(report["total_files"], 3);
    assert_eq!(report["total_size"], 1200);
    assert_eq!(report["categories"].as_array().unwrap().len(), 6);
}

#[test]
fn test_scan_missing_path_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    let output = tidyfile(&["scan", missing.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_duplicates_json() {
    let temp = TempDir::new().unwrap();
    build_scenario(temp.path());

    let report = json(&tidyfile(&[
        "duplicates",
        temp.path().to_str().unwrap(),
        "--algorithm",
        "blake3",
        "--format",
        "json",
    ]));
    assert_eq!(report["group_count"], 1);
    assert_eq!(report["total_wasted_space"], 500);
    assert_eq!(report["algorithm"], "blake3");
}

#[test]
fn test_ext_filter_applies_to_every_command() {
    let temp = TempDir::new().unwrap();
    build_scenario(temp.path());

    let report = json(&tidyfile(&[
        "scan",
        temp.path().to_str().unwrap(),
        "--ext",
        "jpg",
        "--format",
        "json",
    ]));
    assert_eq!(report["total_files"], 1);
}

#[test]
fn test_organize_dry_run_leaves_tree_alone() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    let out = temp.path().join("out");
    build_scenario(&source);

    let plan = json(&tidyfile(&[
        "organize",
        source.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--keepers-only",
        "--dry-run",
        "--format",
        "json",
    ]));
    assert_eq!(plan["actions"].as_array().unwrap().len(), 2);
    assert_eq!(plan["excluded_duplicates"].as_array().unwrap().len(), 1);
    assert!(source.join("a/report.pdf").exists());
    assert!(!out.exists());
}

#[test]
fn test_organize_moves_files() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    let out = temp.path().join("out");
    build_scenario(&source);

    let report = json(&tidyfile(&[
        "organize",
        source.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--format",
        "json",
    ]));
    assert_eq!(report["succeeded"], 3);
    assert_eq!(report["failed"], 0);
    assert!(out.join("image/photo.jpg").is_file());
    assert!(out.join("document/report.pdf").is_file());
    assert!(!source.join("b/photo.jpg").exists());
}

#[test]
fn test_config_file_sets_rule() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    let out = temp.path().join("out");
    build_scenario(&source);
    let config = temp.path().join("tidyfile.toml");
    fs::write(&config, "[organize]\nrule = \"extension\"\ntransfer_mode = \"copy\"\n").unwrap();

    let report = json(&tidyfile(&[
        "--config",
        config.to_str().unwrap(),
        "organize",
        source.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--format",
        "json",
    ]));
    assert_eq!(report["succeeded"], 3);
    assert!(out.join("jpg/photo.jpg").is_file());
    assert!(source.join("b/photo.jpg").is_file());
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.toml");
    fs::write(&config, "[organize]\nrule = \"sideways\"\n").unwrap();

    let output = tidyfile(&[
        "--config",
        config.to_str().unwrap(),
        "scan",
        temp.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_export_writes_index() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    build_scenario(&source);
    let target = temp.path().join("index.json");

    let output = tidyfile(&[
        "export",
        source.to_str().unwrap(),
        "-o",
        target.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let index: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert!(index.is_object());
}

#[test]
fn test_report_with_duplicates() {
    let temp = TempDir::new().unwrap();
    build_scenario(temp.path());

    let report = json(&tidyfile(&[
        "report",
        temp.path().to_str().unwrap(),
        "--find-duplicates",
        "--format",
        "json",
    ]));
    assert_eq!(report["duplicates"]["group_count"], 1);
    assert_eq!(report["duplicates"]["wasted_bytes"], 500);
    assert_eq!(report["age_buckets"].as_array().unwrap().len(), 4);
}
