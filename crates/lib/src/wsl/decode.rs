//! Decoding of `wsl.exe --list` output.
//!
//! `wsl.exe` writes UTF-16LE to a pipe regardless of the console code page,
//! sometimes preceded by a byte order mark.

use std::collections::BTreeSet;

use super::WslError;

const BOM_LE: [u8; 2] = [0xFF, 0xFE];

/// Decode UTF-16LE bytes, with or without a leading byte order mark.
///
/// Fails on an odd byte count or unpaired surrogates; nothing is returned
/// from a partially valid buffer.
pub fn decode_utf16le(bytes: &[u8]) -> Result<String, WslError> {
  let body = bytes.strip_prefix(&BOM_LE[..]).unwrap_or(bytes);

  if body.len() % 2 != 0 {
    return Err(WslError::Decode {
      reason: format!("odd number of bytes ({})", body.len()),
    });
  }

  let units: Vec<u16> = body
    .chunks_exact(2)
    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    .collect();

  String::from_utf16(&units).map_err(|e| WslError::Decode { reason: e.to_string() })
}

/// One name per line; surrounding whitespace trimmed and blank lines dropped.
pub fn parse_distro_names(text: &str) -> BTreeSet<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
pub(crate) fn encode_utf16le(text: &str, bom: bool) -> Vec<u8> {
  let mut out = Vec::new();
  if bom {
    out.extend_from_slice(&BOM_LE);
  }
  for unit in text.encode_utf16() {
    out.extend_from_slice(&unit.to_le_bytes());
  }
  out
}
