//! Integration tests for the `vccs` CLI binary.
//!
//! These tests cover argument parsing, the offline commands against a
//! temporary facility document, config handling and error exit codes,
//! all without a live backend.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const FACILITY: &str = r#"{
  "id": "ZOA",
  "name": "Oakland Center",
  "dial_codes": { "APCH": { "11": "OAK_40_CTR" } },
  "positions": [
    { "cs": "OAK_40_CTR", "label": "Sector 40", "freq": 127800000,
      "lines": [["100", "1", "Tower"], [], ["200", "2", "Shout A"]] }
  ],
  "children": [
    { "id": "NCT", "positions": [
      { "cs": "SFO_U_APP", "label": "Woodside",
        "lines": [["100", "1", "Tower"], ["300", "3", "Bay"]] }
    ] }
  ]
}"#;

// ── Helpers ─────────────────────────────────────────────────────────

/// Scratch directory holding a facility document and a config path.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zoa.json"), FACILITY).unwrap();
        Self { dir }
    }

    fn facility(&self) -> PathBuf {
        self.dir.path().join("zoa.json")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn write_config(&self, body: &str) {
        std::fs::write(self.config(), body).unwrap();
    }

    /// Build a [`Command`] for the `vccs` binary with env isolation.
    ///
    /// Clears all `VCCS_*` overrides and points the config file into the
    /// scratch directory so tests never touch a real configuration.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("vccs");
        cmd.env("VCCS_CONFIG", self.config())
            .env("NO_COLOR", "1")
            .env_remove("VCCS_PROFILE")
            .env_remove("VCCS_BACKEND")
            .env_remove("VCCS_FACILITIES")
            .env_remove("VCCS_OUTPUT")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Same as [`cmd`](Self::cmd) with `--facilities` pointing at the fixture.
    fn offline(&self) -> assert_cmd::Command {
        let mut cmd = self.cmd();
        cmd.arg("--facilities").arg(self.facility());
        cmd
    }
}

fn path_str(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let fx = Fixture::new();
    let output = fx.cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    Fixture::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("directory"))
            .and(predicate::str::contains("dial"))
            .and(predicate::str::contains("positions")),
    );
}

#[test]
fn test_version_flag() {
    Fixture::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vccs"));
}

#[test]
fn test_completions_bash() {
    Fixture::new()
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_run_rejects_bad_duration() {
    Fixture::new()
        .cmd()
        .args(["run", "--for", "soon"])
        .assert()
        .code(2);
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_positions_walks_the_tree() {
    let fx = Fixture::new();
    fx.offline()
        .args(["positions", "-o", "plain"])
        .assert()
        .success()
        .stdout("OAK_40_CTR\nSFO_U_APP\n");

    fx.offline()
        .arg("positions")
        .assert()
        .success()
        .stdout(predicate::str::contains("127.800").and(predicate::str::contains("NCT")));
}

#[test]
fn test_directory_dedups_across_positions() {
    let fx = Fixture::new();
    fx.offline()
        .args(["directory", "OAK_40_CTR", "SFO_U_APP", "-o", "plain"])
        .assert()
        .success()
        .stdout("100\n200\n300\n891\n")
        .stderr(predicate::str::contains("placeholder slots: 1"));
}

#[test]
fn test_directory_json_output() {
    let fx = Fixture::new();
    let output = fx
        .offline()
        .args(["directory", "OAK_40_CTR", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 3);
    assert_eq!(entries[0]["line_id"], "100");
    assert_eq!(entries[1]["slot"], 2);
    assert_eq!(entries[2]["slot"], serde_json::Value::Null);
}

#[test]
fn test_directory_unknown_position() {
    Fixture::new()
        .offline()
        .args(["directory", "NOPE"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("NOPE"));
}

#[test]
fn test_dial_resolves_through_ancestors() {
    Fixture::new()
        .offline()
        .args(["dial", "APCH", "11", "--from", "SFO_U_APP", "-o", "plain"])
        .assert()
        .success()
        .stdout("OAK_40_CTR\n");
}

#[test]
fn test_dial_unknown_code_fails() {
    Fixture::new()
        .offline()
        .args(["dial", "APCH", "99", "--from", "OAK_40_CTR"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("99"));
}

#[test]
fn test_dial_without_position_fails() {
    Fixture::new()
        .offline()
        .args(["dial", "APCH", "11"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No position selected"));
}

#[test]
fn test_missing_facility_file() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["positions", "--facilities"])
        .arg(fx.dir.path().join("absent.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.json"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_no_config_is_a_usage_error() {
    Fixture::new()
        .cmd()
        .arg("positions")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("vccs config init"));
}

#[test]
fn test_run_needs_a_backend() {
    Fixture::new()
        .offline()
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_run_rejects_http_backend() {
    Fixture::new()
        .offline()
        .args(["run", "--backend", "http://127.0.0.1:9002"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("backend"));
}

#[test]
fn test_config_path_honors_override() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_profile_supplies_facilities_and_primary() {
    let fx = Fixture::new();
    fx.write_config(&format!(
        r#"
default_profile = "zoa"

[profiles.zoa]
backend = "ws://127.0.0.1:9002"
facilities = "{}"
positions = ["SFO_U_APP"]
"#,
        path_str(&fx.facility())
    ));

    fx.cmd()
        .args(["dial", "APCH", "11", "-o", "plain"])
        .assert()
        .success()
        .stdout("OAK_40_CTR\n");

    fx.cmd()
        .args(["config", "profiles", "-o", "plain"])
        .assert()
        .success()
        .stdout("zoa\n");

    fx.cmd()
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_profile\": \"zoa\""));
}

#[test]
fn test_unknown_profile() {
    let fx = Fixture::new();
    fx.offline()
        .args(["positions", "--profile", "ghost"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("ghost"));

    fx.cmd()
        .args(["config", "use", "ghost"])
        .assert()
        .code(4);
}

#[test]
fn test_config_use_switches_default() {
    let fx = Fixture::new();
    fx.write_config(
        r#"
default_profile = "a"

[profiles.a]
backend = "ws://127.0.0.1:9002"
facilities = "a.json"

[profiles.b]
backend = "ws://127.0.0.1:9003"
facilities = "b.json"
"#,
    );

    fx.cmd().args(["config", "use", "b"]).assert().success();

    let saved = std::fs::read_to_string(fx.config()).unwrap();
    assert!(saved.contains("default_profile = \"b\""), "{saved}");
}
