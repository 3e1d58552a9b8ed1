//! Host library loader backed by `libloading`.

use std::ffi::c_void;

use libloading::Library;

use super::NativeError;
use super::cache::{NativeLoader, ProcAddr};

/// Loads libraries through the host's dynamic linker.
///
/// On Windows only the system directory is searched, so a DLL planted next to
/// the executable or in the working directory is never picked up.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl NativeLoader for SystemLoader {
  type Library = Library;

  fn load(&self, module: &str) -> Result<Library, NativeError> {
    open(module).map_err(|e| NativeError::Load {
      module: module.to_string(),
      source: Box::new(e),
    })
  }

  fn resolve(&self, library: &Library, module: &str, symbol: &str) -> Result<ProcAddr, NativeError> {
    // SAFETY: the address is only called after `NativeProc::cast` to the
    // export's real signature.
    let func = unsafe { library.get::<unsafe extern "system" fn()>(symbol.as_bytes()) }.map_err(|e| {
      NativeError::SymbolNotFound {
        module: module.to_string(),
        symbol: symbol.to_string(),
        source: Box::new(e),
      }
    })?;

    ProcAddr::new(*func as *const c_void).ok_or_else(|| NativeError::SymbolNotFound {
      module: module.to_string(),
      symbol: symbol.to_string(),
      source: "symbol resolved to a null address".into(),
    })
  }
}

#[cfg(windows)]
fn open(module: &str) -> Result<Library, libloading::Error> {
  use libloading::os::windows::{LOAD_LIBRARY_SEARCH_SYSTEM32, Library as WindowsLibrary};

  // SAFETY: system DLLs have no initialisers we need to guard against.
  unsafe { WindowsLibrary::load_with_flags(module, LOAD_LIBRARY_SEARCH_SYSTEM32) }.map(Library::from)
}

#[cfg(not(windows))]
fn open(module: &str) -> Result<Library, libloading::Error> {
  // SAFETY: loading runs the library's initialisers; callers only name
  // well-known system libraries.
  unsafe { Library::new(module) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_library_reports_module() {
    let err = SystemLoader.load("wodman-no-such-library.dll").unwrap_err();
    match err {
      NativeError::Load { module, .. } => assert_eq!(module, "wodman-no-such-library.dll"),
      other => panic!("expected load error, got {other:?}"),
    }
  }

  #[test]
  #[cfg(windows)]
  fn resolves_kernel32_export() {
    let library = SystemLoader.load("kernel32.dll").unwrap();
    let addr = SystemLoader
      .resolve(&library, "kernel32.dll", "GetCurrentProcessId")
      .unwrap();
    assert!(!addr.as_ptr().is_null());

    let err = SystemLoader
      .resolve(&library, "kernel32.dll", "WodmanNoSuchExport")
      .unwrap_err();
    assert!(matches!(err, NativeError::SymbolNotFound { .. }));
  }
}
