//! Process-lifetime cache of dynamically resolved native functions.
//!
//! Libraries are loaded on first use and symbols resolved on first lookup.
//! Entries are never evicted. The lock only guards the maps: loading and
//! resolving happen outside it, so two threads racing on a brand-new symbol may
//! both resolve it. The first insert wins and every caller gets that handle.

use std::any::Any;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::NativeError;

/// Non-null address of a resolved native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcAddr(*const c_void);

// SAFETY: a function address is immutable, process-wide data.
unsafe impl Send for ProcAddr {}
unsafe impl Sync for ProcAddr {}

impl ProcAddr {
  pub fn new(ptr: *const c_void) -> Option<Self> {
    (!ptr.is_null()).then_some(Self(ptr))
  }

  pub fn as_ptr(self) -> *const c_void {
    self.0
  }
}

/// Capability to load native libraries and look up their exports.
///
/// Implemented by [`super::SystemLoader`] for the host; tests substitute fakes.
pub trait NativeLoader: Send + Sync {
  type Library: Send + Sync + 'static;

  fn load(&self, module: &str) -> Result<Self::Library, NativeError>;

  fn resolve(&self, library: &Self::Library, module: &str, symbol: &str) -> Result<ProcAddr, NativeError>;
}

/// A resolved native function.
///
/// Holds a reference to its library so the code stays mapped for as long as
/// the handle exists.
pub struct NativeProc {
  module: String,
  symbol: String,
  addr: ProcAddr,
  _library: Arc<dyn Any + Send + Sync>,
}

impl NativeProc {
  pub fn module(&self) -> &str {
    &self.module
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn addr(&self) -> ProcAddr {
    self.addr
  }

  /// Reinterpret the address as a function pointer.
  ///
  /// # Safety
  ///
  /// `F` must be a function pointer type whose ABI and signature match the
  /// native export.
  pub unsafe fn cast<F: Copy>(&self) -> F {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*const c_void>());
    // SAFETY: upheld by the caller.
    unsafe { std::mem::transmute_copy(&self.addr.0) }
  }
}

impl std::fmt::Debug for NativeProc {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NativeProc")
      .field("module", &self.module)
      .field("symbol", &self.symbol)
      .field("addr", &self.addr.0)
      .finish()
  }
}

struct ModuleEntry<Lib> {
  library: Arc<Lib>,
  procs: HashMap<String, Arc<NativeProc>>,
}

/// Map of module name to loaded library and its resolved symbols.
pub struct ProcCache<L: NativeLoader> {
  loader: L,
  modules: Mutex<HashMap<String, ModuleEntry<L::Library>>>,
}

impl<L: NativeLoader> ProcCache<L> {
  pub fn new(loader: L) -> Self {
    Self {
      loader,
      modules: Mutex::new(HashMap::new()),
    }
  }

  pub fn loader(&self) -> &L {
    &self.loader
  }

  /// Look up `symbol` in `module`, loading and resolving on first use.
  pub fn resolve(&self, module: &str, symbol: &str) -> Result<Arc<NativeProc>, NativeError> {
    if module.is_empty() {
      return Err(NativeError::Load {
        module: String::new(),
        source: "empty module name".into(),
      });
    }
    if symbol.is_empty() {
      return Err(NativeError::SymbolNotFound {
        module: module.to_string(),
        symbol: String::new(),
        source: "empty symbol name".into(),
      });
    }

    let cached = self
      .lock()
      .get(module)
      .and_then(|entry| entry.procs.get(symbol))
      .cloned();
    if let Some(proc) = cached {
      return Ok(proc);
    }

    let library = self.library(module)?;
    debug!(module, symbol, "resolving native symbol");
    let addr = self.loader.resolve(&library, module, symbol)?;
    let erased: Arc<dyn Any + Send + Sync> = library.clone();
    let proc = Arc::new(NativeProc {
      module: module.to_string(),
      symbol: symbol.to_string(),
      addr,
      _library: erased,
    });

    let mut modules = self.lock();
    let entry = modules.entry(module.to_string()).or_insert_with(|| ModuleEntry {
      library,
      procs: HashMap::new(),
    });
    Ok(entry.procs.entry(symbol.to_string()).or_insert(proc).clone())
  }

  /// Number of loaded modules.
  pub fn module_count(&self) -> usize {
    self.lock().len()
  }

  fn library(&self, module: &str) -> Result<Arc<L::Library>, NativeError> {
    if let Some(library) = self.lock().get(module).map(|entry| entry.library.clone()) {
      return Ok(library);
    }

    debug!(module, "loading native library");
    let library = Arc::new(self.loader.load(module)?);

    let mut modules = self.lock();
    let entry = modules.entry(module.to_string()).or_insert_with(|| ModuleEntry {
      library,
      procs: HashMap::new(),
    });
    Ok(entry.library.clone())
  }

  // Every critical section is a single map operation, so a poisoned map is
  // still consistent.
  fn lock(&self) -> MutexGuard<'_, HashMap<String, ModuleEntry<L::Library>>> {
    self.modules.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
