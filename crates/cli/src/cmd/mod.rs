mod config;
mod register;
mod status;
mod up;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::runtime::Runtime;
use tracing::debug;

use wodman_lib::config::{self as lib_config, Config, LoadedConfig};
use wodman_lib::consts::SERVICE_HOST;
use wodman_lib::native::NativeBridge;
use wodman_lib::wsl::{DistroManager, WslExe};

pub use config::cmd_config;
pub use register::cmd_register;
pub use status::cmd_status;
pub use up::cmd_up;

/// Command-line overrides, applied over the file and environment.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
  /// TCP port for the podman service
  #[arg(long, global = true)]
  pub port: Option<u16>,

  /// Name of the WSL distribution
  #[arg(long, global = true)]
  pub distro: Option<String>,

  /// Install location for the distribution (environment references are expanded)
  #[arg(long, global = true)]
  pub distro_path: Option<String>,

  /// Register the distribution without starting podman
  #[arg(long, global = true)]
  pub register_only: bool,

  /// Gzipped root filesystem to import instead of the embedded one
  #[arg(long, global = true, value_name = "FILE")]
  pub archive: Option<PathBuf>,
}

impl Overrides {
  pub fn apply(&self, config: &mut Config) {
    if let Some(port) = self.port {
      config.port = port;
    }
    if let Some(distro) = &self.distro {
      config.distro = distro.clone();
    }
    if let Some(path) = &self.distro_path {
      config.distro_path = path.clone();
    }
    if self.register_only {
      config.register_only = true;
    }
  }
}

/// State shared by the commands: the native bridge and effective config.
pub struct Session {
  bridge: NativeBridge,
  loaded: LoadedConfig,
  archive: Option<PathBuf>,
}

impl Session {
  pub fn new(overrides: &Overrides) -> Self {
    let bridge = NativeBridge::new();
    let mut loaded = lib_config::load(&bridge);
    overrides.apply(&mut loaded.config);
    debug!(config = ?loaded.config, source = ?loaded.source, "effective configuration");

    Self {
      bridge,
      loaded,
      archive: overrides.archive.clone(),
    }
  }

  pub fn config(&self) -> &Config {
    &self.loaded.config
  }

  pub fn loaded(&self) -> &LoadedConfig {
    &self.loaded
  }

  pub fn archive_override(&self) -> Option<&Path> {
    self.archive.as_deref()
  }

  /// `tcp://127.0.0.1:<port>`
  pub fn endpoint(&self) -> String {
    format!("tcp://{SERVICE_HOST}:{}", self.config().port)
  }

  pub fn manager(&self) -> Result<DistroManager<WslExe>> {
    let wsl = WslExe::locate(&self.bridge).context("WSL is not available")?;
    Ok(DistroManager::new(wsl))
  }
}

pub(crate) fn runtime() -> Result<Runtime> {
  Runtime::new().context("Failed to create async runtime")
}
