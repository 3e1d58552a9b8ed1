//! Invoking `wsl.exe`.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::{LaunchHandle, WslError, describe_command};
use crate::native::{KnownFolderFlags, KnownFolderId, NativeBridge, NativeLoader};

/// The three ways the manager drives `wsl.exe`.
pub trait WslRunner {
  /// Run to completion and return stdout. Stderr goes to ours.
  fn capture(&self, args: &[OsString]) -> impl Future<Output = Result<Vec<u8>, WslError>> + Send;

  /// Run to completion with inherited stdio. A non-zero exit is an error.
  fn run(&self, args: &[OsString]) -> impl Future<Output = Result<(), WslError>> + Send;

  /// Start the process and return without waiting for it.
  fn spawn(&self, args: &[OsString]) -> Result<LaunchHandle, WslError>;
}

/// The real `wsl.exe`.
#[derive(Debug, Clone)]
pub struct WslExe {
  path: PathBuf,
}

impl WslExe {
  pub const EXECUTABLE: &'static str = "wsl.exe";

  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// `wsl.exe` in the system directory.
  pub fn locate<L: NativeLoader>(bridge: &NativeBridge<L>) -> Result<Self, WslError> {
    let system = bridge
      .known_folder_path(KnownFolderId::SYSTEM, KnownFolderFlags::DEFAULT)
      .map_err(WslError::Locate)?;
    let path = system.join(Self::EXECUTABLE);
    debug!(path = %path.display(), "located wsl.exe");
    Ok(Self { path })
  }

  fn command(&self, args: &[OsString]) -> Command {
    let mut command = Command::new(&self.path);
    command.args(args);
    command
  }

  fn describe(&self, args: &[OsString]) -> String {
    let program = self
      .path
      .file_name()
      .map(|name| name.to_string_lossy().to_string())
      .unwrap_or_else(|| self.path.display().to_string());
    describe_command(&program, args)
  }
}

impl WslRunner for WslExe {
  async fn capture(&self, args: &[OsString]) -> Result<Vec<u8>, WslError> {
    let command = self.describe(args);
    debug!(command = %command, "running");

    let output = self
      .command(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::inherit())
      .output()
      .await
      .map_err(|source| WslError::Spawn {
        command: command.clone(),
        source,
      })?;

    if !output.status.success() {
      return Err(WslError::Exit {
        command,
        code: output.status.code(),
      });
    }

    Ok(output.stdout)
  }

  async fn run(&self, args: &[OsString]) -> Result<(), WslError> {
    let command = self.describe(args);
    debug!(command = %command, "running");

    let status = self
      .command(args)
      .stdin(Stdio::null())
      .status()
      .await
      .map_err(|source| WslError::Spawn {
        command: command.clone(),
        source,
      })?;

    if !status.success() {
      return Err(WslError::Exit {
        command,
        code: status.code(),
      });
    }

    Ok(())
  }

  fn spawn(&self, args: &[OsString]) -> Result<LaunchHandle, WslError> {
    let command = self.describe(args);
    debug!(command = %command, "spawning");

    // Dropping the child neither waits for nor kills it.
    let child = self
      .command(args)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .map_err(|source| WslError::Spawn {
        command: command.clone(),
        source,
      })?;

    Ok(LaunchHandle::new(child.id(), command))
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use std::time::{Duration, Instant};

  fn sh() -> WslExe {
    WslExe::new("/bin/sh")
  }

  fn script(s: &str) -> Vec<OsString> {
    vec!["-c".into(), s.into()]
  }

  #[tokio::test]
  async fn capture_returns_stdout() {
    let out = sh().capture(&script("printf 'podman'")).await.unwrap();
    assert_eq!(out, b"podman");
  }

  #[tokio::test]
  async fn capture_reports_exit_code() {
    let err = sh().capture(&script("exit 3")).await.unwrap_err();
    assert!(matches!(err, WslError::Exit { code: Some(3), .. }), "{err:?}");
  }

  #[tokio::test]
  async fn run_succeeds_on_zero_exit() {
    sh().run(&script("true")).await.unwrap();
  }

  #[tokio::test]
  async fn run_reports_failure() {
    let err = sh().run(&script("exit 1")).await.unwrap_err();
    match err {
      WslError::Exit { command, code } => {
        assert_eq!(code, Some(1));
        assert!(command.starts_with("sh -c"), "{command}");
      }
      other => panic!("expected exit error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn missing_executable_is_spawn_error() {
    let exe = WslExe::new("/nonexistent/wsl.exe");
    let err = exe.capture(&[]).await.unwrap_err();
    assert!(matches!(err, WslError::Spawn { .. }), "{err:?}");
  }

  #[tokio::test]
  async fn spawn_does_not_wait() {
    let start = Instant::now();
    let handle = sh().spawn(&script("sleep 5")).unwrap();
    assert!(start.elapsed() < Duration::from_secs(4));
    assert!(handle.pid().is_some());
    assert!(handle.command().starts_with("sh -c sleep"));
  }
}
