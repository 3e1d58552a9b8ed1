//! Effective settings for the podman distribution.
//!
//! Layers, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. The `[wsl]` table of `<RoamingAppData>/containers/containers.conf`.
//! 3. `PODMAN_PORT`, `PODMAN_DISTRO`, `PODMAN_REGISTERONLY`, `PODMAN_DISTROPATH`.
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::{DEFAULT_DISTRO, DEFAULT_DISTRO_PATH, DEFAULT_PORT, ENV_PREFIX};
use crate::native::{KnownFolderFlags, KnownFolderId, NativeBridge, NativeLoader};

/// Directory under roaming app data holding the config file.
pub const CONFIG_DIR: &str = "containers";
pub const CONFIG_FILE: &str = "containers.conf";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}'")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config file '{path}'")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Loopback TCP port for the podman service.
  #[serde(alias = "Port")]
  pub port: u16,
  /// Name of the WSL distribution.
  #[serde(alias = "Distro")]
  pub distro: String,
  /// Register the distribution but do not start the service.
  #[serde(alias = "RegisterOnly")]
  pub register_only: bool,
  /// Install location for the distribution; may contain variable references.
  #[serde(alias = "DistroPath")]
  pub distro_path: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      distro: DEFAULT_DISTRO.to_string(),
      register_only: false,
      distro_path: DEFAULT_DISTRO_PATH.to_string(),
    }
  }
}

/// Shape of `containers.conf`; other tables are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
  #[serde(default, alias = "WSL")]
  wsl: Config,
}

/// A [`Config`] plus the file it was read from, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedConfig {
  pub config: Config,
  pub source: Option<PathBuf>,
}

impl Config {
  /// Parse the `[wsl]` table out of a `containers.conf` document.
  pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.wsl)
  }

  /// Read `path`. A missing file is `Ok(None)`.
  pub fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    Self::from_toml_str(&content).map(Some).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Apply `PODMAN_*` overrides from the process environment.
  pub fn apply_env(&mut self) {
    self.apply_env_with(|name| std::env::var(name).ok());
  }

  /// Apply `PODMAN_*` overrides using `lookup`. Invalid values are logged and skipped.
  pub fn apply_env_with<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    let var = |suffix: &str| {
      let name = format!("{ENV_PREFIX}{suffix}");
      lookup(&name).map(|value| (name, value))
    };

    if let Some((name, value)) = var("PORT") {
      match parse_int(&value) {
        Some(port) => self.port = port,
        None => warn!(var = %name, value = %value, "ignoring invalid port"),
      }
    }
    if let Some((_, value)) = var("DISTRO") {
      self.distro = value;
    }
    if let Some((_, value)) = var("REGISTERONLY") {
      self.register_only = parse_bool(&value);
    }
    if let Some((_, value)) = var("DISTROPATH") {
      self.distro_path = value;
    }
  }
}

/// `<appdata>/containers/containers.conf`
pub fn config_path(appdata: &Path) -> PathBuf {
  appdata.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Roaming app data from the known folder API, else `%APPDATA%`.
pub fn roaming_app_data<L: NativeLoader>(bridge: &NativeBridge<L>) -> Option<PathBuf> {
  match bridge.known_folder_path(KnownFolderId::ROAMING_APP_DATA, KnownFolderFlags::DEFAULT) {
    Ok(path) => Some(path),
    Err(e) => {
      debug!(error = &e as &dyn std::error::Error, "roaming app data unavailable; falling back to APPDATA");
      std::env::var_os("APPDATA").filter(|v| !v.is_empty()).map(PathBuf::from)
    }
  }
}

/// Defaults, then the config file, then the environment.
pub fn load<L: NativeLoader>(bridge: &NativeBridge<L>) -> LoadedConfig {
  let appdata = roaming_app_data(bridge);
  load_from(appdata.as_deref(), |name| std::env::var(name).ok())
}

/// [`load`] with the app data directory and environment supplied.
///
/// File errors are logged and the file is skipped.
pub fn load_from<F>(appdata: Option<&Path>, lookup: F) -> LoadedConfig
where
  F: Fn(&str) -> Option<String>,
{
  let mut loaded = LoadedConfig {
    config: Config::default(),
    source: None,
  };

  if let Some(appdata) = appdata {
    let path = config_path(appdata);
    match Config::load_file(&path) {
      Ok(Some(config)) => {
        debug!(path = %path.display(), "loaded config file");
        loaded.config = config;
        loaded.source = Some(path);
      }
      Ok(None) => debug!(path = %path.display(), "no config file"),
      Err(e) => warn!(error = &e as &dyn std::error::Error, "ignoring config file"),
    }
  }

  loaded.config.apply_env_with(lookup);
  loaded
}

/// Anything but `""`, `f`, `false`, `n`, `no` and `0` is true.
pub fn parse_bool(value: &str) -> bool {
  !matches!(
    value.trim().to_ascii_lowercase().as_str(),
    "" | "f" | "false" | "n" | "no" | "0"
  )
}

/// Unsigned integer with an optional `0x`, `0o` or `0b` prefix.
///
/// A bare leading `0` also means octal, so `0755` is 493.
pub fn parse_int<T: TryFrom<u64>>(value: &str) -> Option<T> {
  let value = value.trim();
  let value = value.strip_prefix('+').unwrap_or(value);
  let lower = value.to_ascii_lowercase();

  let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
    (rest, 16)
  } else if let Some(rest) = lower.strip_prefix("0o") {
    (rest, 8)
  } else if let Some(rest) = lower.strip_prefix("0b") {
    (rest, 2)
  } else if lower.len() > 1 && lower.starts_with('0') {
    (&lower[1..], 8)
  } else {
    (lower.as_str(), 10)
  };

  let digits = digits.replace('_', "");
  if digits.is_empty() || digits.starts_with(['+', '-']) {
    return None;
  }
  let parsed = u64::from_str_radix(&digits, radix).ok()?;
  T::try_from(parsed).ok()
}
