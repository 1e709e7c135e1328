// jstage-core/src/extract/mod.rs
//! Archive extractors: Debian packages, raw tar streams and zip files.
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use jstage_common::error::{JstageError, Result};

pub mod deb;
pub mod decompress;
pub mod tar;
pub mod zip;

pub use self::deb::{extract_deb, links_path, marker_path, ExtractOutcome};
pub use self::decompress::PayloadCompression;
pub use self::tar::{extract_tar, TarMember, TarMemberKind, TarStats};
pub use self::zip::{extract_zip, extract_zips};

/// Turns an archive entry name into a path relative to the extraction root.
///
/// `.` components are dropped. `..` and absolute names are rejected.
pub(crate) fn sanitize_entry_path(entry: &Path, archive: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for comp in entry.components() {
        match comp {
            Component::Normal(p) => out.push(p),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(JstageError::UnsafePath {
                    archive: archive.to_path_buf(),
                    entry: entry.to_path_buf(),
                });
            }
        }
    }
    Ok(out)
}

/// Writes the contents of `reader` to `path`, replacing whatever was there.
///
/// Read failures are reported as decode failures of `archive`, write failures
/// as extraction I/O errors naming `path`.
pub(crate) fn write_entry<R: Read>(reader: &mut R, path: &Path, archive: &Path) -> Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| JstageError::extraction_io(archive, parent, e))?;
    }
    if fs::symlink_metadata(path).is_ok_and(|m| !m.is_dir()) {
        fs::remove_file(path).map_err(|e| JstageError::extraction_io(archive, path, e))?;
    }
    let mut out = File::create(path).map_err(|e| JstageError::extraction_io(archive, path, e))?;

    let mut buf = [0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(JstageError::decode(archive, e)),
        };
        out.write_all(&buf[..n])
            .map_err(|e| JstageError::extraction_io(archive, path, e))?;
        written += n as u64;
    }
    Ok(written)
}

#[cfg(unix)]
pub(crate) fn apply_mode(path: &Path, mode: u32, archive: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| JstageError::extraction_io(archive, path, e))
}

#[cfg(not(unix))]
pub(crate) fn apply_mode(_path: &Path, _mode: u32, _archive: &Path) -> Result<()> {
    Ok(())
}
