//! Lifecycle of the podman WSL distribution.
//!
//! State is never stored: every check asks `wsl.exe --list` again. The manager
//! is generic over [`WslRunner`] so the process boundary can be faked.
//!
//! ```text
//! ensure_registered ── list --all ──► present? ── no ──► gunzip to temp ──► --import
//! ensure_running    ── list --running ► present? ── no ──► spawn --exec podman service
//! ```

mod archive;
mod decode;
mod launch;
mod manager;
mod runner;

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::consts::{SERVICE_BINARY, SERVICE_HOST};
use crate::native::NativeError;

pub use archive::materialize_archive;
pub use decode::{decode_utf16le, parse_distro_names};
pub use launch::LaunchHandle;
pub use manager::DistroManager;
pub use runner::{WslExe, WslRunner};

/// Which distributions `wsl.exe --list` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistroMode {
  /// Every registered distribution (`--all`).
  Registered,
  /// Only running distributions (`--running`).
  Running,
}

impl DistroMode {
  pub const fn flag(self) -> &'static str {
    match self {
      DistroMode::Registered => "--all",
      DistroMode::Running => "--running",
    }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      DistroMode::Registered => "registered",
      DistroMode::Running => "running",
    }
  }
}

impl fmt::Display for DistroMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Observed state of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistroState {
  Unregistered,
  Stopped,
  Running,
}

impl DistroState {
  /// State of `name` given the registered and running lists.
  pub fn classify(name: &str, registered: &BTreeSet<String>, running: &BTreeSet<String>) -> Self {
    if running.contains(name) {
      DistroState::Running
    } else if registered.contains(name) {
      DistroState::Stopped
    } else {
      DistroState::Unregistered
    }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      DistroState::Unregistered => "unregistered",
      DistroState::Stopped => "stopped",
      DistroState::Running => "running",
    }
  }
}

impl fmt::Display for DistroState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Outcome of [`DistroManager::ensure_registered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
  /// The distribution was already registered; nothing was imported.
  Existing,
  /// The distribution was imported by this call.
  Imported,
}

/// Errors from driving `wsl.exe`.
#[derive(Debug, Error)]
pub enum WslError {
  #[error("failed to locate wsl.exe")]
  Locate(#[source] NativeError),

  /// The process could not be started.
  #[error("failed to run `{command}`")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  /// The process ran but reported failure.
  #[error("`{command}` exited with {}", describe_exit(.code))]
  Exit { command: String, code: Option<i32> },

  /// `wsl.exe --list` produced output that is not UTF-16LE.
  #[error("failed to decode wsl.exe output: {reason}")]
  Decode { reason: String },

  #[error("distro archive is empty")]
  EmptyArchive,

  #[error("could not create temporary archive")]
  CreateArchive(#[source] io::Error),

  #[error("could not decompress distro archive")]
  Decompress(#[source] io::Error),

  #[error("could not write temporary archive")]
  WriteArchive(#[source] io::Error),

  #[error("could not close temporary archive file")]
  CloseArchive(#[source] io::Error),

  #[error("could not remove temporary archive")]
  RemoveArchive(#[source] io::Error),

  #[error("failed to register distribution {distro}")]
  Import {
    distro: String,
    #[source]
    source: Box<WslError>,
  },

  #[error("failed to start {service} in {distro}")]
  Launch {
    distro: String,
    service: String,
    #[source]
    source: Box<WslError>,
  },
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "no exit code".to_string(),
  }
}

/// `--list <mode> --quiet`
pub fn list_args(mode: DistroMode) -> Vec<OsString> {
  vec!["--list".into(), mode.flag().into(), "--quiet".into()]
}

/// `--import <name> <install path> <archive>`
pub fn import_args(name: &str, install_path: &Path, archive: &Path) -> Vec<OsString> {
  vec![
    "--import".into(),
    name.into(),
    install_path.as_os_str().to_owned(),
    archive.as_os_str().to_owned(),
  ]
}

/// `--distribution <name> --exec <binary> <args...>`
pub fn exec_args<I, S>(name: &str, binary: &str, args: I) -> Vec<OsString>
where
  I: IntoIterator<Item = S>,
  S: Into<OsString>,
{
  let mut out: Vec<OsString> = vec!["--distribution".into(), name.into(), "--exec".into(), binary.into()];
  out.extend(args.into_iter().map(Into::into));
  out
}

/// Arguments that start the podman API service on loopback with no idle timeout.
pub fn service_args(port: u16) -> Vec<String> {
  vec![
    "system".to_string(),
    "service".to_string(),
    "--time=0".to_string(),
    format!("tcp:{SERVICE_HOST}:{port}"),
  ]
}

/// Full `--exec` invocation for the podman service.
pub fn podman_service_args(name: &str, port: u16) -> Vec<OsString> {
  exec_args(name, SERVICE_BINARY, service_args(port))
}

/// Render arguments for logs and error messages.
pub(crate) fn describe_command(program: &str, args: &[OsString]) -> String {
  let mut out = program.to_string();
  for arg in args {
    out.push(' ');
    out.push_str(&arg.to_string_lossy());
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn list_args_match_wsl_cli() {
    assert_eq!(list_args(DistroMode::Registered), ["--list", "--all", "--quiet"]);
    assert_eq!(list_args(DistroMode::Running), ["--list", "--running", "--quiet"]);
  }

  #[test]
  fn podman_service_args_bind_loopback() {
    assert_eq!(
      podman_service_args("podman", 1234),
      [
        "--distribution",
        "podman",
        "--exec",
        "/usr/bin/podman",
        "system",
        "service",
        "--time=0",
        "tcp:127.0.0.1:1234"
      ]
    );
  }

  #[test]
  fn import_args_keep_paths_verbatim() {
    let args = import_args("podman", Path::new("C:/wsl/podman"), Path::new("/tmp/wodman-distro-x.tar"));
    assert_eq!(args, ["--import", "podman", "C:/wsl/podman", "/tmp/wodman-distro-x.tar"]);
  }

  #[test]
  fn classify_prefers_running() {
    let registered: BTreeSet<String> = ["podman".to_string(), "alpine".to_string()].into();
    let running: BTreeSet<String> = ["alpine".to_string()].into();

    assert_eq!(DistroState::classify("alpine", &registered, &running), DistroState::Running);
    assert_eq!(DistroState::classify("podman", &registered, &running), DistroState::Stopped);
    assert_eq!(DistroState::classify("debian", &registered, &running), DistroState::Unregistered);
  }

  #[test]
  fn wrapped_errors_do_not_repeat_cause() {
    use std::error::Error as _;

    let err = WslError::Import {
      distro: "podman".to_string(),
      source: Box::new(WslError::Exit {
        command: "wsl.exe --import podman".to_string(),
        code: Some(1),
      }),
    };

    assert_eq!(err.to_string(), "failed to register distribution podman");
    assert_eq!(
      err.source().unwrap().to_string(),
      "`wsl.exe --import podman` exited with exit code 1"
    );

    let err = WslError::Locate(NativeError::Unsupported {
      operation: "known folder lookup",
    });
    assert_eq!(err.to_string(), "failed to locate wsl.exe");
    assert!(err.source().is_some());
  }

  #[test]
  fn exit_error_mentions_code() {
    let err = WslError::Exit {
      command: "wsl.exe --import podman".to_string(),
      code: Some(1),
    };
    assert_eq!(err.to_string(), "`wsl.exe --import podman` exited with exit code 1");

    let err = WslError::Exit {
      command: "wsl.exe".to_string(),
      code: None,
    };
    assert!(err.to_string().ends_with("no exit code"));
  }
}
