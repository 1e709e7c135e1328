// jstage-core/src/extract/tar.rs
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use ::tar::{Archive, Entry, EntryType};
use jstage_common::error::{JstageError, Result};
use tracing::{debug, warn};

use super::{apply_mode, sanitize_entry_path, write_entry};
use crate::fs::normalize_lexically;
use crate::ledger::SymlinkLedger;

/// One tar entry, classified before anything touches the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarMember {
    /// Relative to the extraction root, `./` removed.
    pub path: PathBuf,
    pub kind: TarMemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TarMemberKind {
    File { mode: u32 },
    Directory,
    /// Target exactly as stored in the archive.
    Symlink { target: PathBuf },
    /// Target relative to the archive root.
    HardLink { target: PathBuf },
    Skipped(EntryType),
}

impl TarMember {
    fn from_entry<R: Read>(entry: &Entry<'_, R>, archive: &Path) -> Result<Self> {
        let raw_path = entry
            .path()
            .map_err(|e| JstageError::decode(archive, format!("invalid entry path: {e}")))?;
        let path = sanitize_entry_path(&raw_path, archive)?;
        let header = entry.header();
        let entry_type = header.entry_type();

        let kind = match entry_type {
            EntryType::Regular | EntryType::Continuous => TarMemberKind::File {
                mode: header
                    .mode()
                    .map_err(|e| JstageError::decode(archive, format!("invalid mode: {e}")))?,
            },
            EntryType::Directory => TarMemberKind::Directory,
            EntryType::Symlink | EntryType::Link => {
                let target = entry
                    .link_name()
                    .map_err(|e| JstageError::decode(archive, format!("invalid link name: {e}")))?
                    .ok_or_else(|| {
                        JstageError::decode(
                            archive,
                            format!("link {} has no target", raw_path.display()),
                        )
                    })?
                    .into_owned();
                if entry_type == EntryType::Symlink {
                    TarMemberKind::Symlink { target }
                } else {
                    TarMemberKind::HardLink { target }
                }
            }
            other => TarMemberKind::Skipped(other),
        };
        Ok(Self { path, kind })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TarStats {
    pub files: usize,
    pub dirs: usize,
    pub links: usize,
    pub skipped: usize,
}

/// Streams a tar archive into `dest`.
///
/// Files and directories are written immediately. Symbolic and hard links are
/// resolved to absolute paths under `dest` and handed to `ledger`; no link is
/// created on disk. `archive` only names the source in errors and logs.
pub fn extract_tar<R: Read>(
    reader: R,
    dest: &Path,
    archive: &Path,
    ledger: &mut SymlinkLedger,
) -> Result<TarStats> {
    debug!(
        "Starting TAR extraction of {} into {}",
        archive.display(),
        dest.display()
    );
    fs::create_dir_all(dest).map_err(|e| JstageError::extraction_io(archive, dest, e))?;

    let mut tar = Archive::new(reader);
    let mut stats = TarStats::default();
    let entries = tar
        .entries()
        .map_err(|e| JstageError::decode(archive, e))?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| JstageError::decode(archive, e))?;
        let member = TarMember::from_entry(&entry, archive)?;
        let out_path = dest.join(&member.path);

        match member.kind {
            TarMemberKind::Directory => {
                fs::create_dir_all(&out_path)
                    .map_err(|e| JstageError::extraction_io(archive, &out_path, e))?;
                stats.dirs += 1;
            }
            TarMemberKind::File { mode } => {
                if member.path.as_os_str().is_empty() {
                    stats.skipped += 1;
                    continue;
                }
                write_entry(&mut entry, &out_path, archive)?;
                apply_mode(&out_path, mode, archive)?;
                stats.files += 1;
            }
            TarMemberKind::Symlink { target } => {
                match resolve_symlink_target(&out_path, &target, dest) {
                    Some(resolved) => {
                        ledger.record(out_path, resolved);
                        stats.links += 1;
                    }
                    None => {
                        warn!(
                            "Ignoring link {} in {}: target {} is outside {}",
                            member.path.display(),
                            archive.display(),
                            target.display(),
                            dest.display()
                        );
                        stats.skipped += 1;
                    }
                }
            }
            TarMemberKind::HardLink { target } => {
                let rel = sanitize_entry_path(&target, archive)?;
                ledger.record(out_path, dest.join(rel));
                stats.links += 1;
            }
            TarMemberKind::Skipped(kind) => {
                debug!(
                    "Skipping {:?} entry {} in {}",
                    kind,
                    member.path.display(),
                    archive.display()
                );
                stats.skipped += 1;
            }
        }
    }

    debug!(
        "Extracted {} files, {} dirs, {} links from {}",
        stats.files,
        stats.dirs,
        stats.links,
        archive.display()
    );
    Ok(stats)
}

/// Relative targets resolve against the link's directory; absolute targets
/// against `dest`, never the host root. Returns `None` when a relative target
/// climbs out of `dest`.
fn resolve_symlink_target(link_path: &Path, target: &Path, dest: &Path) -> Option<PathBuf> {
    if target.has_root() {
        let inside: PathBuf = normalize_lexically(target)
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        return Some(dest.join(inside));
    }
    let base = link_path.parent().unwrap_or(dest);
    let resolved = normalize_lexically(&base.join(target));
    if resolved.starts_with(normalize_lexically(dest)) {
        Some(resolved)
    } else {
        None
    }
}
