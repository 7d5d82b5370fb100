//! End-to-end runs of `prepost assign` over real catalog files.

use assert_cmd::Command;
use predicates::prelude::*;

fn prepost() -> Command {
    Command::cargo_bin("prepost").unwrap()
}

fn balanced_catalog(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let mut body = String::from("id,concept,subparts,true,false\n");
    for concept in ["genetics", "ecology", "cells"] {
        for i in 0..4 {
            body.push_str(&format!("{concept}-{i},{concept},2,1,1\n"));
        }
    }
    let path = dir.path().join("items.csv");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn assign_satisfied_run_exits_zero_and_prints_both_sets() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = balanced_catalog(&dir);

    prepost()
        .args(["assign", "--seed", "7", "--catalog"])
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("pre"))
        .stdout(predicate::str::contains("post"))
        .stdout(predicate::str::contains("status: satisfied"));
}

#[test]
fn assign_writes_json_report_and_csv_log() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = balanced_catalog(&dir);
    let report_path = dir.path().join("run.json");
    let log_path = dir.path().join("assignments.csv");

    prepost()
        .args(["assign", "--seed", "7", "--catalog"])
        .arg(&catalog)
        .arg("--output")
        .arg(&report_path)
        .arg("--log")
        .arg(&log_path)
        .assert()
        .success();

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("\"status\": \"satisfied\""));
    assert!(report.contains("\"set_a\""));

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.lines().any(|l| l.starts_with("pre,")));
    assert!(log.lines().any(|l| l.starts_with("post,")));
}

#[test]
fn assign_same_seed_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = balanced_catalog(&dir);
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    for path in [&first, &second] {
        prepost()
            .args(["assign", "--seed", "99", "--catalog"])
            .arg(&catalog)
            .arg("--output")
            .arg(path)
            .assert()
            .success();
    }

    let parse_sets = |path: &std::path::Path| -> (serde_json::Value, serde_json::Value) {
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        (
            v["partition"]["set_a"].clone(),
            v["partition"]["set_b"].clone(),
        )
    };
    assert_eq!(parse_sets(&first), parse_sets(&second));
}

#[test]
fn assign_unsatisfiable_ratio_exits_three_with_violations() {
    let dir = tempfile::tempdir().unwrap();
    // Every subpart keys true; no split can reach the default ratio band.
    let mut body = String::from("id,concept,subparts,true,false\n");
    for i in 0..6 {
        body.push_str(&format!("q{i},genetics,2,2,0\n"));
    }
    let catalog = dir.path().join("items.csv");
    std::fs::write(&catalog, body).unwrap();

    prepost()
        .args(["assign", "--seed", "3", "--catalog"])
        .arg(&catalog)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not satisfied"))
        .stderr(predicate::str::contains("true ratio"));
}

#[test]
fn assign_rejects_zero_questions_per_set_override() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = balanced_catalog(&dir);
    prepost()
        .args(["assign", "--questions-per-set", "0", "--catalog"])
        .arg(&catalog)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("questions_per_set"));
}

#[test]
fn assign_config_file_drives_set_size() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = balanced_catalog(&dir);
    let config = dir.path().join("constraints.toml");
    std::fs::write(
        &config,
        "[sets]\nquestions_per_set = 3\n\n[search]\nseed = 5\n",
    )
    .unwrap();
    let report_path = dir.path().join("run.json");

    prepost()
        .args(["assign", "--catalog"])
        .arg(&catalog)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&report_path)
        .assert()
        .success();

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(v["partition"]["set_a"].as_array().unwrap().len(), 3);
    assert_eq!(v["partition"]["set_b"].as_array().unwrap().len(), 3);
    assert_eq!(v["partition"]["unassigned"].as_array().unwrap().len(), 6);
}
