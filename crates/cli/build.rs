#[path = "build/archive_source.rs"]
mod archive_source;

use std::path::PathBuf;

use archive_source::ARCHIVE_ENV;

/// Embeds the distro root filesystem archive.
///
/// `WODMAN_DISTRO_ARCHIVE` names the gzipped tar; otherwise `image/podman-wsl-distro.tar.gz`
/// is used when present. With neither, an empty archive is embedded and one must be
/// supplied at run time.
fn main() -> Result<(), Box<dyn std::error::Error>> {
  let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
  let out = PathBuf::from(std::env::var("OUT_DIR")?).join("distro.tar.gz");

  println!("cargo:rerun-if-env-changed={ARCHIVE_ENV}");
  let source = archive_source::select(std::env::var_os(ARCHIVE_ENV), &manifest_dir);
  for path in &source.watch {
    println!("cargo:rerun-if-changed={}", path.display());
  }

  match source.archive {
    Some(path) => {
      std::fs::copy(&path, &out).map_err(|e| format!("failed to copy distro archive '{}': {e}", path.display()))?;
    }
    None => {
      println!("cargo:warning=no distro archive found; embedding an empty archive");
      std::fs::write(&out, b"")?;
    }
  }

  Ok(())
}
