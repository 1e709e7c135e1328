// jstage-core/src/pipeline/runner.rs
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use jstage_common::config::Config;
use jstage_common::download::Downloader;
use jstage_common::error::{JstageError, Result};
use jstage_common::model::{ArchiveKind, ArtifactSet, Catalog};
use tracing::{debug, error, info, warn};

use super::plan::{Task, TaskPlanner};
use crate::check::missing_artifacts;
use crate::extract::decompress::xz_reader;
use crate::extract::{extract_deb, extract_tar, extract_zip, extract_zips, ExtractOutcome};
use crate::fs::{copy_flatten, copy_recursive, find_files_named, ScratchDir};
use crate::ledger::{RepairReport, SymlinkLedger};

/// What a staging run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Classes missing before the run.
    pub missing: ArtifactSet,
    pub tasks_run: usize,
    /// `None` when nothing was missing and no scratch directory was made.
    pub scratch: Option<PathBuf>,
    pub repair: RepairReport,
    /// Classes still missing after every task succeeded.
    pub still_missing: ArtifactSet,
}

/// Detects what is missing from java_home, plans, and executes the plan one
/// task at a time. The first failing task ends the run.
pub struct Orchestrator<'a, D: Downloader + ?Sized> {
    config: &'a Config,
    catalog: &'a Catalog,
    downloader: &'a D,
}

impl<'a, D: Downloader + ?Sized> Orchestrator<'a, D> {
    pub fn new(config: &'a Config, catalog: &'a Catalog, downloader: &'a D) -> Self {
        Self {
            config,
            catalog,
            downloader,
        }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let java_home = self.config.java_home();
        let missing = missing_artifacts(java_home, &self.catalog.sentinels);
        if missing.is_empty() {
            info!("{} is complete, nothing to do", java_home.display());
            return Ok(RunSummary::default());
        }
        info!("Missing from {}: {}", java_home.display(), missing);

        let scratch = ScratchDir::choose(self.config);
        if scratch.is_reused() {
            info!("Reusing scratch directory {}", scratch.path().display());
        }
        let tasks = TaskPlanner::new(self.config, self.catalog).plan(missing, &scratch);
        debug!("Planned {} task(s)", tasks.len());

        let mut ledger = SymlinkLedger::new();
        let mut summary = RunSummary {
            missing,
            scratch: Some(scratch.path().to_path_buf()),
            ..RunSummary::default()
        };

        for task in &tasks {
            info!("Running task: {}", task);
            if let Err(e) = self.execute(task, &mut ledger, &mut summary.repair) {
                error!("Task '{}' failed: {}", task, e);
                return Err(e);
            }
            summary.tasks_run += 1;
        }

        summary.still_missing = missing_artifacts(java_home, &self.catalog.sentinels);
        for (class, rel) in self.catalog.sentinels.entries() {
            if summary.still_missing.contains(class) {
                warn!(
                    "{} is still missing after staging: {} does not exist",
                    class,
                    java_home.join(rel).display()
                );
            }
        }
        Ok(summary)
    }

    fn execute(
        &self,
        task: &Task,
        ledger: &mut SymlinkLedger,
        report: &mut RepairReport,
    ) -> Result<()> {
        match task {
            Task::CreateScratch(scratch) => scratch.create(),
            Task::Download { requests, dest_dir } => {
                self.downloader.download_all(requests, dest_dir)
            }
            Task::ExtractPackage {
                archive,
                kind,
                dest,
            } => extract_package(archive, *kind, dest, ledger),
            Task::RepairSymlinks => {
                *report = std::mem::take(ledger).repair();
                if !report.broken.is_empty() {
                    warn!("{} link(s) could not be repaired", report.broken.len());
                }
                Ok(())
            }
            Task::UnzipMatching {
                search_root,
                names,
                dest,
            } => {
                let jars = find_files_named(search_root, names)?;
                if jars.is_empty() {
                    warn!(
                        "None of {} found under {}",
                        names.join(", "),
                        search_root.display()
                    );
                }
                extract_zips(&jars, dest).map(|_| ())
            }
            Task::Unzip { archive, dest } => extract_zip(archive, dest).map(|_| ()),
            Task::CopyFlatten {
                src_dir,
                extension,
                dest,
            } => {
                let copied = copy_flatten(src_dir, extension, dest)?;
                debug!("Copied {} *.{} file(s)", copied, extension);
                Ok(())
            }
            Task::CopyTree { src, dest } => copy_recursive(src, dest).map(|_| ()).map_err(|e| {
                JstageError::Io(std::sync::Arc::new(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to copy {} to {}: {}",
                        src.display(),
                        dest.display(),
                        e
                    ),
                )))
            }),
        }
    }
}

fn extract_package(
    archive: &Path,
    kind: ArchiveKind,
    dest: &Path,
    ledger: &mut SymlinkLedger,
) -> Result<()> {
    let open = || {
        File::open(archive).map(BufReader::new).map_err(|e| {
            JstageError::Io(std::sync::Arc::new(std::io::Error::new(
                e.kind(),
                format!("Failed to open archive {}: {}", archive.display(), e),
            )))
        })
    };
    match kind {
        ArchiveKind::Deb => match extract_deb(archive, dest, ledger)? {
            ExtractOutcome::AlreadyExtracted => Ok(()),
            ExtractOutcome::Extracted { files, dirs, links } => {
                info!(
                    "Extracted {}: {} files, {} dirs, {} links",
                    archive.display(),
                    files,
                    dirs,
                    links
                );
                Ok(())
            }
        },
        ArchiveKind::TarGz => extract_tar(MultiGzDecoder::new(open()?), dest, archive, ledger).map(|_| ()),
        ArchiveKind::TarXz => extract_tar(xz_reader(open()?), dest, archive, ledger).map(|_| ()),
        ArchiveKind::Zip => extract_zip(archive, dest).map(|_| ()),
    }
}
