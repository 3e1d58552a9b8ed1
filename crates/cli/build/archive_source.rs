//! Which distro archive the build embeds, and which paths Cargo should watch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const ARCHIVE_ENV: &str = "WODMAN_DISTRO_ARCHIVE";
pub const IMAGE_DIR: &str = "image";
pub const DEFAULT_ARCHIVE: &str = "podman-wsl-distro.tar.gz";

#[derive(Debug, PartialEq, Eq)]
pub struct ArchiveSource {
  /// File to embed; `None` embeds an empty archive.
  pub archive: Option<PathBuf>,
  /// Existing paths passed to `cargo:rerun-if-changed`.
  pub watch: Vec<PathBuf>,
}

/// `override_path` is the value of [`ARCHIVE_ENV`]. Only existing paths are
/// watched; a missing path would make Cargo rerun the script on every build.
pub fn select(override_path: Option<OsString>, manifest_dir: &Path) -> ArchiveSource {
  if let Some(path) = override_path.filter(|p| !p.is_empty()) {
    let path = PathBuf::from(path);
    let watch = if path.exists() { vec![path.clone()] } else { Vec::new() };
    return ArchiveSource {
      archive: Some(path),
      watch,
    };
  }

  let image_dir = manifest_dir.join(IMAGE_DIR);
  let default = image_dir.join(DEFAULT_ARCHIVE);
  // The directory, not the file, so that adding the archive later is noticed.
  let watch = if image_dir.is_dir() { vec![image_dir] } else { Vec::new() };
  ArchiveSource {
    archive: default.is_file().then_some(default),
    watch,
  }
}
