// jstage-core/src/ledger.rs
//! Run-scoped table of symbolic links seen while unpacking packages.
//!
//! Links are never created while a tar stream is being extracted because their
//! targets may live in a package that has not been unpacked yet. Each link is
//! recorded here instead and materialized by [`SymlinkLedger::repair`] once
//! every package extraction has finished, as a recursive copy of the target.
//! Records are serializable so an unpacked package can hand its links to a
//! later run that reuses the same scratch directory.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fs::copy_recursive;

/// A link found in an archive, resolved to absolute destination paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymlinkRecord {
    pub link_path: PathBuf,
    pub target_path: PathBuf,
}

impl SymlinkRecord {
    pub fn new(link_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            link_path: link_path.into(),
            target_path: target_path.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub repaired: usize,
    pub already_present: usize,
    /// Records whose target never materialized. The run still succeeds.
    pub broken: Vec<SymlinkRecord>,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.repaired + self.already_present + self.broken.len()
    }
}

#[derive(Debug, Default)]
pub struct SymlinkLedger {
    records: BTreeMap<PathBuf, PathBuf>,
}

impl SymlinkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a link. A later record for the same link path replaces the earlier one.
    pub fn record(&mut self, link_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) {
        let link_path = link_path.into();
        let target_path = target_path.into();
        debug!(
            "Recording link {} -> {}",
            link_path.display(),
            target_path.display()
        );
        self.records.insert(link_path, target_path);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.records
            .iter()
            .map(|(link, target)| (link.as_path(), target.as_path()))
    }

    /// Records in link-path order.
    pub fn into_records(self) -> Vec<SymlinkRecord> {
        self.records
            .into_iter()
            .map(|(link, target)| SymlinkRecord::new(link, target))
            .collect()
    }

    /// Materializes every recorded link exactly once.
    ///
    /// A record whose target sits at or below another record's link path is
    /// handled after that record, so chains of links resolve to real content
    /// regardless of the order the archives were unpacked in.
    pub fn repair(self) -> RepairReport {
        let records = self.into_records();
        debug!("Repairing {} recorded links", records.len());

        let mut report = RepairReport::default();
        for idx in dependency_order(&records) {
            let record = &records[idx];
            repair_one(record, &mut report);
        }
        report
    }
}

impl Extend<SymlinkRecord> for SymlinkLedger {
    fn extend<I: IntoIterator<Item = SymlinkRecord>>(&mut self, iter: I) {
        for rec in iter {
            self.record(rec.link_path, rec.target_path);
        }
    }
}

fn repair_one(record: &SymlinkRecord, report: &mut RepairReport) {
    let link = &record.link_path;
    if link.exists() {
        report.already_present += 1;
        return;
    }

    // A dangling OS-level symlink would make the copy write through it.
    if fs::symlink_metadata(link).is_ok_and(|m| m.file_type().is_symlink()) {
        if let Err(e) = fs::remove_file(link) {
            debug!("Failed to remove dangling link {}: {}", link.display(), e);
        }
    }

    match copy_recursive(&record.target_path, link) {
        Ok(_) => {
            debug!(
                "Materialized {} from {}",
                link.display(),
                record.target_path.display()
            );
            report.repaired += 1;
        }
        Err(e) => {
            warn!(
                "Broken symlink {} -> {}: {}",
                link.display(),
                record.target_path.display(),
                e
            );
            report.broken.push(record.clone());
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

fn dependency_order(records: &[SymlinkRecord]) -> Vec<usize> {
    let deps: Vec<Vec<usize>> = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            records
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && rec.target_path.starts_with(&other.link_path))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut state = vec![Visit::New; records.len()];
    let mut order = Vec::with_capacity(records.len());
    for start in 0..records.len() {
        visit(start, &deps, &mut state, &mut order);
    }
    order
}

fn visit(idx: usize, deps: &[Vec<usize>], state: &mut [Visit], order: &mut Vec<usize>) {
    // Active means a cycle; the record is emitted when its first visit unwinds.
    if state[idx] != Visit::New {
        return;
    }
    state[idx] = Visit::Active;
    for &dep in &deps[idx] {
        visit(dep, deps, state, order);
    }
    state[idx] = Visit::Done;
    order.push(idx);
}
