//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `mdc` binary and verify exit codes,
//! stdout content, and stderr content.
//!
//! All tests set `current_dir` to the workspace root so that `mdc.toml`
//! and the bundled `content/` directory resolve correctly.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `mdc` binary, rooted at workspace.
fn mdc() -> Command {
    let mut cmd = cargo_bin_cmd!("mdc");
    cmd.current_dir(workspace_root());
    cmd.env_remove("MDC_LOG");
    cmd
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write temp file");
    path
}

const BROKEN_GENERATOR: &str = r#"{
  "id": "broken",
  "title": "Broken",
  "fields": [{ "name": "x", "type": "text" }],
  "outputTemplate": "line one\n{{#if x}}never closed"
}"#;

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    mdc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Paperwork generator toolchain"));
}

#[test]
fn version_exits_0() {
    mdc()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdc"));
}

// ──────────────────────────────────────────────
// 2. validate
// ──────────────────────────────────────────────

#[test]
fn validate_bundled_generator() {
    mdc()
        .args(["validate", "content/generators/arrest-report.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn validate_json_output_reports_id() {
    let output = mdc()
        .args([
            "--output",
            "json",
            "validate",
            "content/generators/traffic-citation.json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["id"], "traffic-citation");
}

#[test]
fn validate_reports_template_error_location() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.json", BROKEN_GENERATOR);

    mdc()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid generator"))
        .stderr(predicate::str::contains(
            "2:1: unterminated '{{#if}}' block",
        ));

    let output = mdc()
        .args(["--output", "json", "validate"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["location"]["line"], 2);
    assert_eq!(json["location"]["column"], 1);
}

#[test]
fn validate_rejects_schema_violation() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "bad.json",
        r#"{"id": "bad", "title": "Bad", "fields": [{"name": "x", "type": "slider"}], "outputTemplate": ""}"#,
    );
    mdc()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid generator"));
}

#[test]
fn validate_raw_template() {
    let dir = TempDir::new().unwrap();
    let good = write_file(&dir, "good.hbs", "{{#each officers}}{{name}}{{/each}}");
    let bad = write_file(&dir, "bad.hbs", "{{#foo}}{{/foo}}");

    mdc()
        .args(["validate", "--raw"])
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    mdc()
        .args(["validate", "--raw"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown block helper 'foo'"));
}

#[test]
fn validate_missing_file() {
    mdc()
        .args(["validate", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading generator"));
}

// ──────────────────────────────────────────────
// 3. render
// ──────────────────────────────────────────────

#[test]
fn render_by_id_matches_expected_output() {
    let expected =
        fs::read_to_string(workspace_root().join("content/expected/arrest-report.txt")).unwrap();
    mdc()
        .args([
            "render",
            "arrest-report",
            "--data",
            "content/forms/arrest-report.json",
            "--today",
            "2025-06-07",
        ])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn render_by_path_with_json_output() {
    let output = mdc()
        .args([
            "--output",
            "json",
            "render",
            "content/generators/traffic-citation.json",
            "--data",
            "content/forms/traffic-citation.json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["generator"], "traffic-citation");
    assert!(json["output"]
        .as_str()
        .unwrap()
        .contains("Release after 06/JUN/2025."));
}

#[test]
fn render_raw_template_uses_today() {
    let dir = TempDir::new().unwrap();
    let template = write_file(&dir, "t.hbs", "{{name}} due {{addDays missing 3}}");
    let data = write_file(&dir, "d.json", r#"{"name": "Bell"}"#);

    mdc()
        .args(["render", "--raw"])
        .arg(&template)
        .arg("--data")
        .arg(&data)
        .args(["--today", "2025-12-30"])
        .assert()
        .success()
        .stdout("Bell due 02/JAN/2026");
}

#[test]
fn render_unknown_generator_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "d.json", "{}");
    mdc()
        .args(["render", "no-such-report", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("generator 'no-such-report' not found"));
}

#[test]
fn render_rejects_non_object_form() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "d.json", "[1, 2]");
    mdc()
        .args(["render", "arrest-report", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("form data must be a JSON object"));
}

#[test]
fn render_rejects_bad_today() {
    mdc()
        .args([
            "render",
            "arrest-report",
            "--data",
            "content/forms/arrest-report.json",
            "--today",
            "07/06/2025",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --today"));
}

#[test]
fn quiet_suppresses_error_text() {
    mdc()
        .args(["--quiet", "render", "no-such-report", "--data", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 4. list and config
// ──────────────────────────────────────────────

#[test]
fn list_bundled_generators() {
    mdc()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("arrest-report\tArrest Report"))
        .stdout(predicate::str::contains("traffic-citation\tTraffic Citation"));
}

#[test]
fn list_json_output() {
    let output = mdc().args(["--output", "json", "list"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["arrest-report", "traffic-citation"]);
}

#[test]
fn config_points_at_another_generators_dir() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("gens")).unwrap();
    write_file(
        &dir,
        "gens/note.json",
        r#"{"id": "note", "title": "Note", "fields": [], "outputTemplate": "hi"}"#,
    );
    let config = write_file(&dir, "custom.toml", "generators_dir = \"gens\"\n");

    mdc()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("note\tNote"))
        .stdout(predicate::str::contains("arrest-report").not());
}

#[test]
fn missing_explicit_config_fails() {
    mdc()
        .args(["--config", "nowhere.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read 'nowhere.toml'"));
}
