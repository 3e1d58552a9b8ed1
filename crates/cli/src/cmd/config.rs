//! Implementation of the `wodman config` command.

use anyhow::Result;

use super::Session;
use crate::output::{OutputFormat, print_json, print_stat, yes_no};

pub fn cmd_config(session: &Session, output: OutputFormat) -> Result<()> {
  let loaded = session.loaded();

  if output.is_json() {
    return print_json(loaded);
  }

  let config = &loaded.config;
  let source = loaded
    .source
    .as_ref()
    .map(|path| path.display().to_string())
    .unwrap_or_else(|| "(defaults)".to_string());

  print_stat("Source", &source);
  print_stat("Distro", &config.distro);
  print_stat("Port", &config.port.to_string());
  print_stat("Distro path", &config.distro_path);
  print_stat("Register only", yes_no(config.register_only));
  print_stat("Endpoint", &session.endpoint());
  Ok(())
}
