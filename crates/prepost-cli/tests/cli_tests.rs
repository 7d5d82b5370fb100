use assert_cmd::Command;
use predicates::prelude::*;

fn prepost() -> Command {
    Command::cargo_bin("prepost").unwrap()
}

fn write_catalog(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

const BALANCED_CATALOG: &str = "\
id,concept,subparts,true,false
g1,genetics,2,1,1
g2,genetics,2,1,1
e1,ecology,2,1,1
e2,ecology,2,1,1
";

#[test]
fn help_lists_subcommands() {
    prepost()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assign"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn validate_accepts_well_formed_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "items.csv", BALANCED_CATALOG);
    prepost()
        .args(["validate", "--catalog"])
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 items across 2 concepts"));
}

#[test]
fn validate_rejects_broken_answer_key_with_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(
        &dir,
        "items.csv",
        "id,concept,subparts,true,false\nq1,genetics,3,2,2\n",
    );
    prepost()
        .args(["validate", "--catalog"])
        .arg(&catalog)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("answer key mismatch"));
}

#[test]
fn missing_catalog_file_is_exit_1() {
    prepost()
        .args(["validate", "--catalog", "/nonexistent/items.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read catalog file"));
}

#[test]
fn inspect_prints_concept_breakdown() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "items.csv", BALANCED_CATALOG);
    prepost()
        .args(["inspect", "--catalog"])
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("genetics"))
        .stdout(predicate::str::contains("ecology"))
        .stdout(predicate::str::contains("(all)"));
}

#[test]
fn init_writes_template_and_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("constraints.toml");

    prepost()
        .args(["init", "--path"])
        .arg(&path)
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[balance]"));
    assert!(written.contains("true_ratio_min = 0.4"));

    prepost()
        .args(["init", "--path"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    prepost()
        .args(["init", "--force", "--path"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn init_template_is_accepted_by_validate() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("constraints.toml");
    let catalog = write_catalog(&dir, "items.csv", BALANCED_CATALOG);

    prepost()
        .args(["init", "--path"])
        .arg(&config)
        .assert()
        .success();
    prepost()
        .args(["validate", "--catalog"])
        .arg(&catalog)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn validate_warns_about_infeasible_inputs() {
    let dir = tempfile::tempdir().unwrap();
    // Too few items for two sets of 3, and every answer keys true.
    let catalog = write_catalog(
        &dir,
        "items.csv",
        "id,concept,subparts,true,false\nq1,genetics,2,2,0\nq2,genetics,2,2,0\n",
    );
    prepost()
        .args(["validate", "--catalog"])
        .arg(&catalog)
        .args(["--config", "/dev/null"])
        .assert()
        .success()
        .stdout(predicate::str::contains("overall true ratio 1.000"));

    let config = dir.path().join("constraints.toml");
    std::fs::write(&config, "[sets]\nquestions_per_set = 3\n").unwrap();
    prepost()
        .args(["validate", "--catalog"])
        .arg(&catalog)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("two sets of 3 need 6"));
}

#[test]
fn bad_constraint_file_is_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "items.csv", BALANCED_CATALOG);
    let config = dir.path().join("constraints.toml");
    std::fs::write(&config, "[balance]\ntrue_ratio_min = 0.8\ntrue_ratio_max = 0.2\n").unwrap();

    prepost()
        .args(["validate", "--catalog"])
        .arg(&catalog)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("true_ratio_min"));
}
