//! Ensuring the distribution is registered and its service is running.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::archive::materialize_archive;
use super::decode::{decode_utf16le, parse_distro_names};
use super::{
  DistroMode, DistroState, LaunchHandle, Registration, WslError, WslRunner, import_args, list_args,
  podman_service_args,
};
use crate::consts::SERVICE_BINARY;
use crate::env;

/// Drives a [`WslRunner`] to bring a distribution up.
///
/// Checks and actions are not atomic: two managers racing on the same
/// distribution can both see it missing and both import (or launch). The
/// second import then fails in `wsl.exe`.
#[derive(Debug)]
pub struct DistroManager<R> {
  runner: R,
  temp_dir: Option<PathBuf>,
}

impl<R: WslRunner> DistroManager<R> {
  pub fn new(runner: R) -> Self {
    Self { runner, temp_dir: None }
  }

  /// Directory for the temporary archive; the system temp dir by default.
  pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.temp_dir = Some(dir.into());
    self
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  /// Names reported by `wsl.exe --list <mode> --quiet`.
  pub async fn query_distros(&self, mode: DistroMode) -> Result<BTreeSet<String>, WslError> {
    let output = self.runner.capture(&list_args(mode)).await?;
    let text = decode_utf16le(&output)?;
    let names = parse_distro_names(&text);
    debug!(%mode, distros = ?names, "listed distributions");
    Ok(names)
  }

  /// Exact, case-sensitive membership of `name` in [`Self::query_distros`].
  pub async fn is_distro_present(&self, name: &str, mode: DistroMode) -> Result<bool, WslError> {
    let present = self.query_distros(mode).await?.contains(name);
    if !present {
      debug!(distro = %name, %mode, "distribution not present");
    }
    Ok(present)
  }

  pub async fn state(&self, name: &str) -> Result<DistroState, WslError> {
    let registered = self.query_distros(DistroMode::Registered).await?;
    let running = self.query_distros(DistroMode::Running).await?;
    Ok(DistroState::classify(name, &registered, &running))
  }

  /// Import `name` from a gzipped tar unless it is already registered.
  ///
  /// An existing registration is trusted as-is. `install_path` may reference
  /// environment variables.
  pub async fn ensure_registered(
    &self,
    name: &str,
    install_path: &str,
    archive: &[u8],
  ) -> Result<Registration, WslError> {
    self.ensure_registered_with(name, install_path, || Ok::<_, WslError>(archive)).await
  }

  /// Like [`Self::ensure_registered`], but `archive` is only called when an
  /// import is needed.
  pub async fn ensure_registered_with<F, A, E>(
    &self,
    name: &str,
    install_path: &str,
    archive: F,
  ) -> Result<Registration, E>
  where
    F: FnOnce() -> Result<A, E>,
    A: AsRef<[u8]>,
    E: From<WslError>,
  {
    if self.is_distro_present(name, DistroMode::Registered).await? {
      info!(distro = %name, "distribution already registered");
      return Ok(Registration::Existing);
    }
    let archive = archive()?;
    self.import(name, install_path, archive.as_ref()).await?;
    Ok(Registration::Imported)
  }

  async fn import(&self, name: &str, install_path: &str, archive: &[u8]) -> Result<(), WslError> {
    let temp_dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
    let archive_path = materialize_archive(archive, &temp_dir)?;

    let install_path = PathBuf::from(env::expand(install_path));
    info!(
      distro = %name,
      path = %install_path.display(),
      archive = %archive_path.display(),
      "registering distribution"
    );

    let result = self
      .runner
      .run(&import_args(name, &install_path, &archive_path))
      .await
      .map_err(|source| WslError::Import {
        distro: name.to_string(),
        source: Box::new(source),
      });

    let location: PathBuf = archive_path.to_path_buf();
    let removed = archive_path.close();

    match (result, removed) {
      (Err(err), Err(remove_err)) => {
        warn!(path = %location.display(), error = %remove_err, "failed to remove temporary archive");
        Err(err)
      }
      (Err(err), Ok(())) => Err(err),
      (Ok(()), Err(remove_err)) => Err(WslError::RemoveArchive(remove_err)),
      (Ok(()), Ok(())) => Ok(()),
    }
  }

  /// Start the podman service in `name` unless the distribution is running.
  ///
  /// Returns once the launcher process exists, with its handle; `None` when
  /// nothing had to be started. The service may still be initializing.
  pub async fn ensure_running(&self, name: &str, port: u16) -> Result<Option<LaunchHandle>, WslError> {
    if self.is_distro_present(name, DistroMode::Running).await? {
      info!(distro = %name, "distribution already running");
      return Ok(None);
    }

    info!(distro = %name, port, "distribution not running; starting podman");
    let handle = self
      .runner
      .spawn(&podman_service_args(name, port))
      .map_err(|source| WslError::Launch {
        distro: name.to_string(),
        service: SERVICE_BINARY.to_string(),
        source: Box::new(source),
      })?;
    debug!(launch = %handle, "launched podman service");
    Ok(Some(handle))
  }
}
