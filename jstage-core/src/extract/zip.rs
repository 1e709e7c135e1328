// jstage-core/src/extract/zip.rs
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ::zip::ZipArchive;
use jstage_common::error::{JstageError, Result};
use tracing::{debug, info, warn};

use super::{apply_mode, write_entry};

/// Extracts every entry of the zip (or jar) at `archive_path` into `dest`,
/// overwriting existing files. Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    info!("Unzipping {} into {}", archive_path.display(), dest.display());
    let file = File::open(archive_path).map_err(|e| {
        JstageError::Io(std::sync::Arc::new(std::io::Error::new(
            e.kind(),
            format!("Failed to open archive {}: {}", archive_path.display(), e),
        )))
    })?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| JstageError::decode(archive_path, format!("not a readable zip: {e}")))?;

    fs::create_dir_all(dest).map_err(|e| JstageError::extraction_io(archive_path, dest, e))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            JstageError::decode(archive_path, format!("error reading entry {i}: {e}"))
        })?;

        let Some(rel) = entry.enclosed_name() else {
            warn!(
                "Skipping unsafe entry name {} in {}",
                entry.name(),
                archive_path.display()
            );
            continue;
        };
        let out_path = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| JstageError::extraction_io(archive_path, &out_path, e))?;
            continue;
        }

        write_entry(&mut entry, &out_path, archive_path)?;
        if let Some(mode) = entry.unix_mode() {
            apply_mode(&out_path, mode, archive_path)?;
        }
        written += 1;
    }

    debug!("Wrote {} files from {}", written, archive_path.display());
    Ok(written)
}

/// Extracts `archives` in order. The first failure aborts the remaining ones.
pub fn extract_zips(archives: &[PathBuf], dest: &Path) -> Result<usize> {
    let mut total = 0;
    for archive in archives {
        total += extract_zip(archive, dest)?;
    }
    Ok(total)
}
