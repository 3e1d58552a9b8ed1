//! Materializing the embedded root filesystem for `wsl.exe --import`.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use tempfile::TempPath;
use tracing::debug;

use super::WslError;

const ARCHIVE_PREFIX: &str = "wodman-distro-";
const ARCHIVE_SUFFIX: &str = ".tar";

/// Gunzip `archive` into a fresh `wodman-distro-*.tar` file inside `dir`.
///
/// The file is closed before returning so other processes can open it. It is
/// deleted when the returned [`TempPath`] drops, and on every error path here.
pub fn materialize_archive(archive: &[u8], dir: &Path) -> Result<TempPath, WslError> {
  if archive.is_empty() {
    return Err(WslError::EmptyArchive);
  }

  let mut file = tempfile::Builder::new()
    .prefix(ARCHIVE_PREFIX)
    .suffix(ARCHIVE_SUFFIX)
    .tempfile_in(dir)
    .map_err(WslError::CreateArchive)?;

  let written = copy_decompressed(&mut GzDecoder::new(archive), file.as_file_mut())?;
  file.as_file().sync_all().map_err(WslError::CloseArchive)?;

  debug!(path = %file.path().display(), bytes = written, "materialized distro archive");
  Ok(file.into_temp_path())
}

/// Like `io::copy`, but keeps read (decompression) and write failures apart.
fn copy_decompressed<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<u64, WslError> {
  let mut buf = vec![0u8; 64 * 1024];
  let mut total = 0u64;

  loop {
    let n = match reader.read(&mut buf) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == ErrorKind::Interrupted => continue,
      Err(e) => return Err(WslError::Decompress(e)),
    };
    writer.write_all(&buf[..n]).map_err(WslError::WriteArchive)?;
    total += n as u64;
  }

  writer.flush().map_err(WslError::WriteArchive)?;
  Ok(total)
}

#[cfg(test)]
pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
  use flate2::Compression;
  use flate2::write::GzEncoder;

  let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
  encoder.write_all(data).unwrap();
  encoder.finish().unwrap()
}
