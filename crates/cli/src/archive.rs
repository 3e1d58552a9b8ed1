//! The distro root filesystem shipped inside the binary.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Gzipped tar embedded by the build script; empty if none was available.
static EMBEDDED: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/distro.tar.gz"));

pub fn embedded() -> &'static [u8] {
  EMBEDDED
}

/// The archive at `path`, or the embedded one.
pub fn load(path: Option<&Path>) -> Result<Cow<'static, [u8]>> {
  match path {
    Some(path) => {
      let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read distro archive '{}'", path.display()))?;
      debug!(path = %path.display(), bytes = bytes.len(), "using distro archive from file");
      Ok(Cow::Owned(bytes))
    }
    None => {
      debug!(bytes = EMBEDDED.len(), "using embedded distro archive");
      Ok(Cow::Borrowed(embedded()))
    }
  }
}
