//! Bridge to host native interfaces.
//!
//! [`NativeBridge`] owns the process-wide [`ProcCache`] and is constructed once
//! at startup, then shared by reference. Everything that needs a native export
//! goes through it so each library is loaded and each symbol resolved once.

pub mod cache;
pub mod hresult;
pub mod known_folder;
pub mod loader;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use cache::{NativeLoader, NativeProc, ProcAddr, ProcCache};
pub use hresult::{FACILITY_WIN32, HResult, HResultError};
pub use known_folder::{KnownFolderFlags, KnownFolderId};
pub use loader::SystemLoader;

/// Errors from native library access.
#[derive(Debug, Error)]
pub enum NativeError {
  /// The library could not be loaded.
  #[error("failed to load {module}")]
  Load {
    module: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The library has no such export.
  #[error("symbol {symbol} not found in {module}")]
  SymbolNotFound {
    module: String,
    symbol: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// A native call returned a failing result code.
  #[error("{call} failed")]
  Status {
    call: &'static str,
    #[source]
    source: HResultError,
  },

  /// A native call succeeded but returned no data.
  #[error("{call} returned a null result")]
  NullResult { call: &'static str },

  #[error("{context} is not valid UTF-16")]
  InvalidUtf16 { context: &'static str },

  #[error("{operation} is not supported on this platform")]
  Unsupported { operation: &'static str },
}

/// Entry point for native calls.
pub struct NativeBridge<L: NativeLoader = SystemLoader> {
  procs: ProcCache<L>,
}

impl NativeBridge<SystemLoader> {
  pub fn new() -> Self {
    Self::with_loader(SystemLoader)
  }
}

impl Default for NativeBridge<SystemLoader> {
  fn default() -> Self {
    Self::new()
  }
}

impl<L: NativeLoader> NativeBridge<L> {
  pub fn with_loader(loader: L) -> Self {
    Self {
      procs: ProcCache::new(loader),
    }
  }

  /// Resolve `symbol` exported by `module`, cached for the process lifetime.
  pub fn resolve(&self, module: &str, symbol: &str) -> Result<Arc<NativeProc>, NativeError> {
    self.procs.resolve(module, symbol)
  }

  /// Path of a known folder such as [`KnownFolderId::SYSTEM`].
  pub fn known_folder_path(&self, id: KnownFolderId, flags: KnownFolderFlags) -> Result<PathBuf, NativeError> {
    known_folder::known_folder_path(&self.procs, id, flags)
  }
}
