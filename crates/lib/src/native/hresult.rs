//! HRESULT decoding.
//!
//! An HRESULT packs a severity bit (31), a facility (bits 16-30) and a code
//! (bits 0-15). Failures in `FACILITY_WIN32` carry a plain Win32 error number
//! in the code, which is surfaced as an [`std::io::Error`] so callers can match
//! on [`std::io::ErrorKind`] or [`std::io::Error::raw_os_error`].

use std::fmt;
use std::io;

use thiserror::Error;

/// Facility for results wrapping a Win32 error code.
pub const FACILITY_WIN32: u32 = 7;

const SEVERITY_ERROR: u32 = 0x8000_0000;
const FACILITY_MASK: u32 = 0x7FFF;

/// A raw native result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(u32);

impl HResult {
  pub const fn new(raw: u32) -> Self {
    Self(raw)
  }

  pub const fn raw(self) -> u32 {
    self.0
  }

  /// True when the severity bit is clear.
  pub const fn is_ok(self) -> bool {
    self.0 & SEVERITY_ERROR == 0
  }

  /// Bits 16-30.
  pub const fn facility(self) -> u32 {
    (self.0 >> 16) & FACILITY_MASK
  }

  /// Bits 0-15.
  pub const fn code(self) -> u16 {
    (self.0 & 0xFFFF) as u16
  }

  /// Classify a failing code.
  ///
  /// Returns `None` for success codes. Win32-facility failures become an OS
  /// error built from the low 16 bits; anything else is opaque.
  pub fn to_error(self) -> Option<HResultError> {
    if self.is_ok() {
      return None;
    }
    if self.facility() == FACILITY_WIN32 {
      return Some(HResultError::Os(io::Error::from_raw_os_error(i32::from(self.code()))));
    }
    Some(HResultError::Opaque(self))
  }

  pub fn ok(self) -> Result<(), HResultError> {
    match self.to_error() {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}

impl From<u32> for HResult {
  fn from(raw: u32) -> Self {
    Self(raw)
  }
}

impl From<i32> for HResult {
  fn from(raw: i32) -> Self {
    Self(raw as u32)
  }
}

impl fmt::Display for HResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:08x}", self.0)
  }
}

/// A failed [`HResult`].
#[derive(Debug, Error)]
pub enum HResultError {
  /// Win32 error carried in `FACILITY_WIN32`.
  #[error(transparent)]
  Os(io::Error),

  /// Any other failure; displayed as the zero-padded hex code.
  #[error("{0}")]
  Opaque(HResult),
}

impl HResultError {
  /// The Win32 error number, if this wraps one.
  pub fn raw_os_error(&self) -> Option<i32> {
    match self {
      HResultError::Os(err) => err.raw_os_error(),
      HResultError::Opaque(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn success_codes_are_ok() {
    for raw in [0, 1, 0x0007_0002, 0x7FFF_FFFF] {
      let hr = HResult::new(raw);
      assert!(hr.is_ok());
      assert!(hr.to_error().is_none());
      assert!(hr.ok().is_ok());
    }
  }

  #[test]
  fn win32_not_found_maps_to_os_error() {
    // HRESULT_FROM_WIN32(ERROR_FILE_NOT_FOUND)
    let err = HResult::new(0x8007_0002).to_error().unwrap();
    assert_eq!(err.raw_os_error(), Some(2));
    match err {
      HResultError::Os(io) => assert_eq!(io.kind(), io::ErrorKind::NotFound),
      other => panic!("expected OS error, got {other:?}"),
    }
  }

  #[test]
  fn e_fail_is_opaque() {
    let err = HResult::new(0x8000_4005).to_error().unwrap();
    assert!(matches!(err, HResultError::Opaque(_)));
    assert_eq!(err.to_string(), "80004005");
    assert_eq!(err.raw_os_error(), None);
  }

  #[test]
  fn reserved_bits_break_win32_match() {
    // Bit 27 set: facility is 0x807, not FACILITY_WIN32.
    let err = HResult::new(0x8807_0002).to_error().unwrap();
    assert_eq!(err.to_string(), "88070002");
  }

  #[test]
  fn opaque_display_is_zero_padded() {
    assert_eq!(HResult::new(0x8000_0001).to_string(), "80000001");
    assert_eq!(HResult::new(0x0000_00ff).to_string(), "000000ff");
  }

  #[test]
  fn signed_conversion_preserves_bits() {
    let hr = HResult::from(-2147024894_i32);
    assert_eq!(hr.raw(), 0x8007_0002);
  }

  proptest! {
    #[test]
    fn severity_clear_is_always_ok(raw in 0u32..0x8000_0000) {
      let hr = HResult::new(raw);
      prop_assert!(hr.is_ok());
      prop_assert!(hr.to_error().is_none());
    }

    #[test]
    fn win32_facility_yields_low_word(code in any::<u16>()) {
      let raw = 0x8000_0000 | (FACILITY_WIN32 << 16) | u32::from(code);
      let err = HResult::new(raw).to_error().unwrap();
      prop_assert_eq!(err.raw_os_error(), Some(i32::from(code)));
    }

    #[test]
    fn other_facilities_display_as_hex(facility in 0u32..0x8000, code in any::<u16>()) {
      prop_assume!(facility != FACILITY_WIN32);
      let raw = 0x8000_0000 | (facility << 16) | u32::from(code);
      let err = HResult::new(raw).to_error().unwrap();
      prop_assert_eq!(err.to_string(), format!("{:08x}", raw));
    }
  }
}
