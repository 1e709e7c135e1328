// jstage-core/src/extract/deb.rs
//! Unpacks the `data.tar.*` member of a Debian package.
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use jstage_common::error::{JstageError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use super::decompress::{inflate_gzip, xz_reader, PayloadCompression};
use super::tar::{extract_tar, TarStats};
use crate::ledger::{SymlinkLedger, SymlinkRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The marker was already present; only the saved links were recorded.
    AlreadyExtracted,
    Extracted {
        files: usize,
        dirs: usize,
        links: usize,
    },
}

impl From<TarStats> for ExtractOutcome {
    fn from(stats: TarStats) -> Self {
        ExtractOutcome::Extracted {
            files: stats.files,
            dirs: stats.dirs,
            links: stats.links,
        }
    }
}

/// `<deb>.tar`, written next to the package once its payload is fully unpacked.
pub fn marker_path(deb: &Path) -> PathBuf {
    sibling_path(deb, ".tar")
}

/// `<deb>.links`, the package's link records. Written before the marker.
pub fn links_path(deb: &Path) -> PathBuf {
    sibling_path(deb, ".links")
}

fn sibling_path(deb: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(deb.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Extracts the payload of `deb` into `dest`, feeding its links to `ledger`.
///
/// The `ar` members are scanned in order and the first `data.tar.gz` or
/// `data.tar.xz` wins. A gzip payload is inflated in memory and kept as the
/// marker file; for xz the payload is streamed and an empty marker is written.
/// When the marker already exists nothing is unpacked, but the links saved
/// by the earlier extraction are recorded again.
pub fn extract_deb(deb: &Path, dest: &Path, ledger: &mut SymlinkLedger) -> Result<ExtractOutcome> {
    let marker = marker_path(deb);
    if marker.exists() {
        let replayed = replay_links(deb, ledger)?;
        info!(
            "{} already extracted, {} link(s) recorded again",
            deb.display(),
            replayed
        );
        return Ok(ExtractOutcome::AlreadyExtracted);
    }
    info!("Extracting {}", deb.display());

    let file = File::open(deb).map_err(|e| {
        JstageError::Io(std::sync::Arc::new(std::io::Error::new(
            e.kind(),
            format!("Failed to open package {}: {}", deb.display(), e),
        )))
    })?;
    let mut archive = ar::Archive::new(file);
    let mut unsupported: Option<String> = None;
    let mut found = SymlinkLedger::new();

    while let Some(entry_result) = archive.next_entry() {
        let mut entry = entry_result.map_err(|e| JstageError::decode(deb, e))?;
        let identifier = String::from_utf8_lossy(entry.header().identifier()).into_owned();
        let name = identifier.trim_end_matches('/');

        match PayloadCompression::classify(name) {
            None => debug!("Skipping member {} of {}", name, deb.display()),
            Some(Err(scheme)) => {
                debug!("Member {} of {} uses {}", name, deb.display(), scheme);
                unsupported.get_or_insert(scheme);
            }
            Some(Ok(PayloadCompression::Gzip)) => {
                debug!("Found {} in {}", name, deb.display());
                let (stats, tar_file) = extract_gzip_member(&mut entry, deb, &marker, dest, &mut found)?;
                let records = save_links(deb, found)?;
                tar_file
                    .persist(&marker)
                    .map_err(|e| JstageError::extraction_io(deb, &marker, e.error))?;
                ledger.extend(records);
                return Ok(stats.into());
            }
            Some(Ok(PayloadCompression::Xz)) => {
                debug!("Found {} in {}", name, deb.display());
                let stats = extract_tar(BufReader::new(xz_reader(&mut entry)), dest, deb, &mut found)?;
                let records = save_links(deb, found)?;
                File::create(&marker).map_err(|e| JstageError::extraction_io(deb, &marker, e))?;
                ledger.extend(records);
                return Ok(stats.into());
            }
        }
    }

    let err = match unsupported {
        Some(scheme) => JstageError::UnsupportedCompression {
            archive: deb.to_path_buf(),
            scheme,
        },
        None => JstageError::MissingPayload {
            archive: deb.to_path_buf(),
        },
    };
    error!("{}", err);
    Err(err)
}

/// Inflates the member into a temp file next to the marker and extracts from it.
/// The caller persists the returned file as the marker.
fn extract_gzip_member<R: Read>(
    member: &mut R,
    deb: &Path,
    marker: &Path,
    dest: &Path,
    ledger: &mut SymlinkLedger,
) -> Result<(TarStats, NamedTempFile)> {
    let mut compressed = Vec::new();
    member
        .read_to_end(&mut compressed)
        .map_err(|e| JstageError::decode(deb, e))?;
    let tar_bytes = inflate_gzip(&compressed, deb)?;
    drop(compressed);

    let sidecar_dir = marker.parent().unwrap_or_else(|| Path::new("."));
    let mut sidecar = NamedTempFile::new_in(sidecar_dir)
        .map_err(|e| JstageError::extraction_io(deb, sidecar_dir, e))?;
    let sidecar_path = sidecar.path().to_path_buf();
    sidecar
        .write_all(&tar_bytes)
        .and_then(|()| sidecar.as_file_mut().seek(SeekFrom::Start(0)).map(|_| ()))
        .map_err(|e| JstageError::extraction_io(deb, &sidecar_path, e))?;
    drop(tar_bytes);
    debug!("Wrote tar sidecar {}", sidecar_path.display());

    let stats = extract_tar(BufReader::new(sidecar.as_file_mut()), dest, deb, ledger)?;
    Ok((stats, sidecar))
}

fn save_links(deb: &Path, found: SymlinkLedger) -> Result<Vec<SymlinkRecord>> {
    let path = links_path(deb);
    let records = found.into_records();
    let body = serde_json::to_vec_pretty(&records)?;
    fs::write(&path, body).map_err(|e| JstageError::extraction_io(deb, &path, e))?;
    debug!("Saved {} link(s) to {}", records.len(), path.display());
    Ok(records)
}

fn replay_links(deb: &Path, ledger: &mut SymlinkLedger) -> Result<usize> {
    let path = links_path(deb);
    if !path.exists() {
        debug!("No saved links for {}", deb.display());
        return Ok(0);
    }
    let body = fs::read(&path)?;
    let records: Vec<SymlinkRecord> =
        serde_json::from_slice(&body).map_err(|e| JstageError::decode(&path, e))?;
    let count = records.len();
    ledger.extend(records);
    Ok(count)
}
