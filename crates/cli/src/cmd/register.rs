//! Implementation of the `wodman register` command.

use std::time::Instant;

use anyhow::{Context, Result};

use wodman_lib::wsl::{DistroManager, Registration, WslRunner};

use super::{Session, runtime};
use crate::archive;
use crate::output::{format_elapsed, print_info, print_success};

pub fn cmd_register(session: &Session) -> Result<()> {
  let manager = session.manager()?;
  runtime()?.block_on(register(session, &manager))
}

/// Import the configured distribution if it is missing, reporting what happened.
pub(super) async fn register<R: WslRunner>(session: &Session, manager: &DistroManager<R>) -> Result<()> {
  let config = session.config();
  let started = Instant::now();

  let outcome = manager
    .ensure_registered_with(&config.distro, &config.distro_path, || {
      archive::load(session.archive_override())
    })
    .await
    .with_context(|| format!("Failed to register '{}'", config.distro))?;

  match outcome {
    Registration::Existing => print_info(&format!("Distribution '{}' is already registered", config.distro)),
    Registration::Imported => print_success(&format!(
      "Registered '{}' in {}",
      config.distro,
      format_elapsed(started.elapsed())
    )),
  }
  Ok(())
}
