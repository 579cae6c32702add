//! Binary-level tests for commands that never touch a container runtime.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::process::{Command, Output};

const STACK: &str = r"
project: invest
services:
  pgbouncer:
    image: edoburu/pgbouncer
    ports: ['6432:5432']
    depends_on: [db]
    env:
      DB_HOST: db
      DB_PASSWORD: ${POSTGRES_PASSWORD}
  db:
    image: postgres:15
    ports: ['5432:5432']
    env:
      POSTGRES_USER: ${POSTGRES_USER}
      POSTGRES_PASSWORD: ${POSTGRES_PASSWORD}
      POSTGRES_DB: ${POSTGRES_DB:-invest}
";

fn stackup(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stackup"))
        .current_dir(dir)
        .env_remove("STACKUP_FILE")
        .env_remove("POSTGRES_USER")
        .env_remove("POSTGRES_PASSWORD")
        .env_remove("POSTGRES_DB")
        .args(args)
        .output()
        .unwrap()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stackup.yml"), STACK).unwrap();
    std::fs::write(
        dir.path().join(".env.example"),
        "POSTGRES_USER=example\nPOSTGRES_PASSWORD=changeme\n",
    )
    .unwrap();
    std::fs::write(dir.path().join(".env"), "POSTGRES_PASSWORD=hunter2\n").unwrap();
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn validate_reports_start_order() {
    let dir = project();
    let output = stackup(dir.path(), &["validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("db \u{2192} pgbouncer"));
}

#[test]
fn plan_json_layers_env_files() {
    let dir = project();
    let output = stackup(dir.path(), &["plan", "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["project"], "invest");
    let db = &plan["services"][0];
    assert_eq!(db["name"], "db");
    assert_eq!(db["env"]["POSTGRES_USER"], "example");
    assert_eq!(db["env"]["POSTGRES_PASSWORD"], "hunter2");
    assert_eq!(db["env"]["POSTGRES_DB"], "invest");
    assert_eq!(db["network"], "invest_default");
    assert_eq!(plan["services"][1]["depends_on"][0], "db");
}

#[test]
fn plan_text_masks_secrets() {
    let dir = project();
    let output = stackup(dir.path(), &["plan"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(!text.contains("hunter2"));
    assert!(text.contains("POSTGRES_PASSWORD=****"));
}

#[test]
fn missing_variable_fails_before_anything_starts() {
    let dir = project();
    let output = stackup(dir.path(), &["--no-default-env-files", "up", "--dry-run"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("missing required variable"), "stderr: {err}");
    assert!(!err.contains("would start"));
}

#[test]
fn dry_run_lists_services_without_saving_state() {
    let dir = project();
    let output = stackup(dir.path(), &["up", "--dry-run"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    let db = err.find("would start \x1b[1mdb").unwrap();
    let bouncer = err.find("would start \x1b[1mpgbouncer").unwrap();
    assert!(db < bouncer);
    assert!(!dir.path().join(".stackup").exists());
}

#[test]
fn project_flag_overrides_declaration() {
    let dir = project();
    let output = stackup(dir.path(), &["--project", "sandbox", "plan", "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["project"], "sandbox");
    assert_eq!(plan["services"][0]["network"], "sandbox_default");
}

#[test]
fn cycle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("cyclic.yml"),
        "services:\n  a:\n    image: x\n    depends_on: [b]\n  b:\n    image: x\n    depends_on: [a]\n",
    )
    .unwrap();
    let output = stackup(dir.path(), &["-f", "cyclic.yml", "validate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cyclic dependency"));
}
