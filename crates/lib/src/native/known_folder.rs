//! Known folder resolution via `SHGetKnownFolderPath`.

use std::fmt;
use std::path::PathBuf;

use bitflags::bitflags;

use super::NativeError;
use super::cache::{NativeLoader, ProcCache};

/// A `KNOWNFOLDERID`. Laid out like a Win32 `GUID`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnownFolderId {
  data1: u32,
  data2: u16,
  data3: u16,
  data4: [u8; 8],
}

impl KnownFolderId {
  /// `FOLDERID_System`, e.g. `C:\Windows\System32`.
  pub const SYSTEM: Self = Self::new(
    0x1AC1_4E77,
    0x02E7,
    0x4E5D,
    [0xB7, 0x44, 0x2E, 0xB1, 0xAE, 0x51, 0x98, 0xB7],
  );

  /// `FOLDERID_RoamingAppData`, i.e. `%APPDATA%`.
  pub const ROAMING_APP_DATA: Self = Self::new(
    0x3EB6_85DB,
    0x65F9,
    0x4CF6,
    [0xA0, 0x3A, 0xE3, 0xEF, 0x65, 0x72, 0x9F, 0x3D],
  );

  /// `FOLDERID_LocalAppData`, i.e. `%LOCALAPPDATA%`.
  pub const LOCAL_APP_DATA: Self = Self::new(
    0xF1B3_2785,
    0x6FBA,
    0x4FCF,
    [0x9D, 0x55, 0x7B, 0x8E, 0x7F, 0x15, 0x70, 0x91],
  );

  pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
    Self {
      data1,
      data2,
      data3,
      data4,
    }
  }
}

impl fmt::Display for KnownFolderId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let d = &self.data4;
    write!(
      f,
      "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
      self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
    )
  }
}

bitflags! {
  /// `KNOWN_FOLDER_FLAG` values. The empty set is `KF_FLAG_DEFAULT`.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct KnownFolderFlags: u32 {
    const CREATE = 0x0000_8000;
    const NO_PACKAGE_REDIRECTION = 0x0001_0000;
    const FORCE_PACKAGE_REDIRECTION = 0x0002_0000;
    const RETURN_FILTER_REDIRECTION_TARGET = 0x0004_0000;
    const FORCE_APP_DATA_REDIRECTION = 0x0008_0000;
  }
}

impl KnownFolderFlags {
  pub const DEFAULT: Self = Self::empty();
  /// Older SDK name for [`Self::NO_PACKAGE_REDIRECTION`].
  pub const NO_APPCONTAINER_REDIRECTION: Self = Self::NO_PACKAGE_REDIRECTION;
  /// Older SDK name for [`Self::FORCE_PACKAGE_REDIRECTION`].
  pub const FORCE_APPCONTAINER_REDIRECTION: Self = Self::FORCE_PACKAGE_REDIRECTION;
}

/// A NUL-terminated wide string allocated by native code.
///
/// The allocation is released exactly once, when the guard drops.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) struct NativeWideString {
  ptr: *mut u16,
  free: unsafe fn(*mut u16),
}

#[cfg_attr(not(windows), allow(dead_code))]
impl NativeWideString {
  /// # Safety
  ///
  /// `ptr` must be null or point to a NUL-terminated UTF-16 string that stays
  /// valid until `free` is called on it, and nothing else may free it.
  pub(crate) unsafe fn from_raw(ptr: *mut u16, free: unsafe fn(*mut u16)) -> Self {
    Self { ptr, free }
  }

  fn as_wide(&self) -> &[u16] {
    if self.ptr.is_null() {
      return &[];
    }
    // SAFETY: non-null and NUL-terminated per `from_raw`.
    unsafe {
      let mut len = 0;
      while *self.ptr.add(len) != 0 {
        len += 1;
      }
      std::slice::from_raw_parts(self.ptr, len)
    }
  }

  /// Copy the string out; `None` when the pointer is null.
  pub(crate) fn copy_out(&self, context: &'static str) -> Result<Option<String>, NativeError> {
    if self.ptr.is_null() {
      return Ok(None);
    }
    String::from_utf16(self.as_wide())
      .map(Some)
      .map_err(|_| NativeError::InvalidUtf16 { context })
  }
}

impl Drop for NativeWideString {
  fn drop(&mut self) {
    if !self.ptr.is_null() {
      // SAFETY: `from_raw` hands ownership of the allocation to this guard.
      unsafe { (self.free)(self.ptr) };
    }
  }
}

#[cfg(windows)]
pub(crate) fn known_folder_path<L: NativeLoader>(
  procs: &ProcCache<L>,
  id: KnownFolderId,
  flags: KnownFolderFlags,
) -> Result<PathBuf, NativeError> {
  use std::ffi::c_void;

  use tracing::debug;

  use super::hresult::HResult;

  type SHGetKnownFolderPathFn =
    unsafe extern "system" fn(rfid: *const KnownFolderId, flags: u32, token: *mut c_void, path: *mut *mut u16) -> i32;

  unsafe fn co_task_mem_free(ptr: *mut u16) {
    // SAFETY: the shell allocates the out string with CoTaskMemAlloc.
    unsafe { windows_sys::Win32::System::Com::CoTaskMemFree(ptr as *const c_void) }
  }

  let proc = procs.resolve("shell32.dll", "SHGetKnownFolderPath")?;
  // SAFETY: matches the documented shell32 export.
  let get_known_folder_path: SHGetKnownFolderPathFn = unsafe { proc.cast() };

  let mut raw: *mut u16 = std::ptr::null_mut();
  // SAFETY: `id` outlives the call and `raw` is a valid out pointer.
  let hr = HResult::from(unsafe { get_known_folder_path(&id, flags.bits(), std::ptr::null_mut(), &mut raw) });
  // The out string must be freed even when the call fails.
  // SAFETY: `raw` is null or a CoTaskMemAlloc'd NUL-terminated string.
  let path = unsafe { NativeWideString::from_raw(raw, co_task_mem_free) };

  if let Some(source) = hr.to_error() {
    return Err(NativeError::Status {
      call: "SHGetKnownFolderPath",
      source,
    });
  }

  let path = path
    .copy_out("known folder path")?
    .ok_or(NativeError::NullResult {
      call: "SHGetKnownFolderPath",
    })?;
  debug!(folder = %id, path = %path, "resolved known folder");
  Ok(PathBuf::from(path))
}

#[cfg(not(windows))]
pub(crate) fn known_folder_path<L: NativeLoader>(
  _procs: &ProcCache<L>,
  _id: KnownFolderId,
  _flags: KnownFolderFlags,
) -> Result<PathBuf, NativeError> {
  Err(NativeError::Unsupported {
    operation: "known folder lookup",
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  static FREED: AtomicUsize = AtomicUsize::new(0);

  fn leak_wide(s: &str) -> *mut u16 {
    let wide: Box<[u16]> = s.encode_utf16().chain(Some(0)).collect();
    Box::into_raw(wide) as *mut u16
  }

  fn leak_units(units: &[u16]) -> *mut u16 {
    let wide: Box<[u16]> = units.iter().copied().chain(Some(0)).collect();
    Box::into_raw(wide) as *mut u16
  }

  unsafe fn counting_free(ptr: *mut u16) {
    FREED.fetch_add(1, Ordering::SeqCst);
    // SAFETY: every pointer here came from a leaked Box<[u16]>.
    unsafe {
      let mut len = 0;
      while *ptr.add(len) != 0 {
        len += 1;
      }
      drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len + 1)));
    }
  }

  // Both cases share the counter, so they run in one test.
  #[test]
  fn wide_string_is_freed_exactly_once() {
    let before = FREED.load(Ordering::SeqCst);
    {
      let s = unsafe { NativeWideString::from_raw(leak_wide("C:\\Windows\\System32"), counting_free) };
      assert_eq!(s.copy_out("test").unwrap().as_deref(), Some("C:\\Windows\\System32"));
      // Copying twice does not release anything.
      assert!(s.copy_out("test").is_ok());
    }
    assert_eq!(FREED.load(Ordering::SeqCst), before + 1);

    {
      // Lone high surrogate: decoding fails, memory is still released.
      let s = unsafe { NativeWideString::from_raw(leak_units(&[0x0043, 0xD800]), counting_free) };
      assert!(matches!(
        s.copy_out("test"),
        Err(NativeError::InvalidUtf16 { context: "test" })
      ));
    }
    assert_eq!(FREED.load(Ordering::SeqCst), before + 2);

    {
      let s = unsafe { NativeWideString::from_raw(std::ptr::null_mut(), counting_free) };
      assert_eq!(s.copy_out("test").unwrap(), None);
    }
    assert_eq!(FREED.load(Ordering::SeqCst), before + 2);
  }

  #[test]
  fn folder_ids_format_as_guids() {
    assert_eq!(
      KnownFolderId::SYSTEM.to_string(),
      "{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}"
    );
    assert_eq!(
      KnownFolderId::ROAMING_APP_DATA.to_string(),
      "{3EB685DB-65F9-4CF6-A03A-E3EF65729F3D}"
    );
  }

  #[test]
  fn default_flags_are_zero() {
    assert_eq!(KnownFolderFlags::DEFAULT.bits(), 0);
    assert_eq!(KnownFolderFlags::default(), KnownFolderFlags::DEFAULT);
    assert_eq!(KnownFolderFlags::CREATE.bits(), 0x8000);
  }

  #[test]
  #[cfg(windows)]
  fn resolves_system_folder() {
    let procs = ProcCache::new(super::super::SystemLoader);
    let path = known_folder_path(&procs, KnownFolderId::SYSTEM, KnownFolderFlags::DEFAULT).unwrap();
    assert!(path.join("kernel32.dll").exists());
  }

  #[test]
  #[cfg(not(windows))]
  fn unsupported_off_windows() {
    let procs = ProcCache::new(super::super::SystemLoader);
    let err = known_folder_path(&procs, KnownFolderId::SYSTEM, KnownFolderFlags::DEFAULT).unwrap_err();
    assert!(matches!(err, NativeError::Unsupported { .. }));
  }
}
