//! Implementation of the `wodman status` command.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;

use wodman_lib::wsl::{DistroMode, DistroState};

use super::{Session, runtime};
use crate::output::{
  OutputFormat, format_list, print_info, print_json, print_stat, print_success, print_warning, yes_no,
};

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
  distro: &'a str,
  state: DistroState,
  registered: bool,
  running: bool,
  endpoint: String,
  registered_distros: BTreeSet<String>,
  running_distros: BTreeSet<String>,
}

pub fn cmd_status(session: &Session, output: OutputFormat) -> Result<()> {
  let manager = session.manager()?;
  let rt = runtime()?;

  let (registered, running) = rt.block_on(async {
    let registered = manager.query_distros(DistroMode::Registered).await?;
    let running = manager.query_distros(DistroMode::Running).await?;
    anyhow::Ok((registered, running))
  })?;

  let distro = session.config().distro.as_str();
  let state = DistroState::classify(distro, &registered, &running);
  let report = StatusReport {
    distro,
    state,
    registered: state != DistroState::Unregistered,
    running: state == DistroState::Running,
    endpoint: session.endpoint(),
    registered_distros: registered,
    running_distros: running,
  };

  if output.is_json() {
    return print_json(&report);
  }

  match state {
    DistroState::Running => print_success(&format!("'{distro}' is running")),
    DistroState::Stopped => print_warning(&format!("'{distro}' is registered but not running; run `wodman up`")),
    DistroState::Unregistered => print_info(&format!("'{distro}' is not registered")),
  }
  print_stat("Registered", yes_no(report.registered));
  print_stat("Running", yes_no(report.running));
  print_stat("Endpoint", &report.endpoint);
  println!();
  print_stat("All registered", &format_list(&report.registered_distros));
  print_stat("All running", &format_list(&report.running_distros));

  Ok(())
}
