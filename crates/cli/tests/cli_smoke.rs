//! CLI smoke tests for wodman.
//!
//! Nothing here needs WSL: commands that would invoke `wsl.exe` are only
//! exercised for their failure path on hosts without it.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
  "PODMAN_PORT",
  "PODMAN_DISTRO",
  "PODMAN_REGISTERONLY",
  "PODMAN_DISTROPATH",
  "RUST_LOG",
];

/// A wodman command with no inherited configuration.
fn wodman_cmd(appdata: &TempDir) -> Command {
  let mut cmd = cargo_bin_cmd!("wodman");
  for var in ENV_VARS {
    cmd.env_remove(var);
  }
  cmd.env("APPDATA", appdata.path());
  cmd
}

fn write_conf(appdata: &TempDir, content: &str) {
  let dir = appdata.path().join("containers");
  std::fs::create_dir_all(&dir).unwrap();
  std::fs::write(dir.join("containers.conf"), content).unwrap();
}

fn config_json(cmd: &mut Command) -> serde_json::Value {
  let output = cmd.args(["config", "--output", "json"]).assert().success().get_output().clone();
  serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  let appdata = TempDir::new().unwrap();
  wodman_cmd(&appdata)
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  let appdata = TempDir::new().unwrap();
  wodman_cmd(&appdata)
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("wodman"));
}

#[test]
fn subcommand_help_works() {
  let appdata = TempDir::new().unwrap();
  for cmd in &["up", "register", "status", "config"] {
    wodman_cmd(&appdata)
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn unknown_output_format_fails() {
  let appdata = TempDir::new().unwrap();
  wodman_cmd(&appdata)
    .args(["config", "--output", "yaml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("yaml"));
}

// =============================================================================
// Config
// =============================================================================

// Windows resolves roaming app data through the shell, not APPDATA.
#[cfg(not(windows))]
mod config {
  use super::*;

  #[test]
  fn defaults_without_file_or_env() {
    let appdata = TempDir::new().unwrap();
    let json = config_json(&mut wodman_cmd(&appdata));

    assert_eq!(json["config"]["port"], 1234);
    assert_eq!(json["config"]["distro"], "podman");
    assert_eq!(json["config"]["register_only"], false);
    assert_eq!(json["config"]["distro_path"], "${LOCALAPPDATA}/podman");
    assert!(json["source"].is_null());
  }

  #[test]
  fn file_then_env_then_flags() {
    let appdata = TempDir::new().unwrap();
    write_conf(
      &appdata,
      "[wsl]\nport = 2000\ndistro = \"fromfile\"\ndistro_path = \"/srv/podman\"\n",
    );

    let json = config_json(
      wodman_cmd(&appdata)
        .env("PODMAN_PORT", "0x1F90")
        .env("PODMAN_DISTRO", "fromenv")
        .args(["--distro", "fromflag"]),
    );

    assert_eq!(json["config"]["port"], 8080);
    assert_eq!(json["config"]["distro"], "fromflag");
    assert_eq!(json["config"]["distro_path"], "/srv/podman");
    assert!(json["source"].as_str().unwrap().ends_with("containers.conf"));
  }

  #[test]
  fn register_only_from_env() {
    let appdata = TempDir::new().unwrap();
    let json = config_json(wodman_cmd(&appdata).env("PODMAN_REGISTERONLY", "true"));
    assert_eq!(json["config"]["register_only"], true);

    let json = config_json(wodman_cmd(&appdata).env("PODMAN_REGISTERONLY", "no"));
    assert_eq!(json["config"]["register_only"], false);
  }

  #[test]
  fn broken_file_warns_and_uses_defaults() {
    let appdata = TempDir::new().unwrap();
    write_conf(&appdata, "[wsl\nport = ");

    wodman_cmd(&appdata)
      .args(["config", "--output", "json"])
      .assert()
      .success()
      .stdout(predicate::str::contains("\"port\": 1234"))
      .stderr(predicate::str::contains("ignoring config file"));
  }

  #[test]
  fn text_output_shows_endpoint() {
    let appdata = TempDir::new().unwrap();
    wodman_cmd(&appdata)
      .args(["--port", "2375", "config"])
      .assert()
      .success()
      .stdout(predicate::str::contains("tcp://127.0.0.1:2375"))
      .stdout(predicate::str::contains("(defaults)"));
  }
}

// =============================================================================
// WSL commands off Windows
// =============================================================================

#[cfg(not(windows))]
mod without_wsl {
  use super::*;

  #[test]
  fn up_fails_cleanly() {
    let appdata = TempDir::new().unwrap();
    wodman_cmd(&appdata)
      .assert()
      .failure()
      .stderr(predicate::str::contains("WSL is not available"));
  }

  #[test]
  fn status_fails_cleanly() {
    let appdata = TempDir::new().unwrap();
    let output = wodman_cmd(&appdata)
      .arg("status")
      .assert()
      .failure()
      .get_output()
      .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WSL is not available: failed to locate wsl.exe"), "{stderr}");
    assert_eq!(stderr.matches("not supported on this platform").count(), 1, "{stderr}");
  }
}
