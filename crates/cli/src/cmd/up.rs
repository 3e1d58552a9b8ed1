//! Implementation of the `wodman up` command.
//!
//! Registers the distribution when needed, then starts the podman service in
//! it unless register-only mode is set. Prints the service endpoint last.

use anyhow::{Context, Result};

use super::register::register;
use super::{Session, runtime};
use crate::output::{print_endpoint, print_info, print_success};

pub fn cmd_up(session: &Session) -> Result<()> {
  let manager = session.manager()?;
  let config = session.config();
  let rt = runtime()?;

  rt.block_on(register(session, &manager))?;

  if config.register_only {
    print_info("Register-only mode; not starting podman");
    return Ok(());
  }

  let launched = rt
    .block_on(manager.ensure_running(&config.distro, config.port))
    .with_context(|| format!("Failed to start podman in '{}'", config.distro))?;

  match launched {
    Some(handle) => match handle.pid() {
      Some(pid) => print_success(&format!("Started podman in '{}' (pid {pid})", config.distro)),
      None => print_success(&format!("Started podman in '{}'", config.distro)),
    },
    None => print_info(&format!("Distribution '{}' is already running", config.distro)),
  }

  print_endpoint(&session.endpoint());
  Ok(())
}
