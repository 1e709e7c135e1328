// jstage-core/src/pipeline/plan.rs
use std::fmt;
use std::path::PathBuf;

use jstage_common::config::Config;
use jstage_common::download::DownloadRequest;
use jstage_common::model::{ArchiveKind, ArtifactSet, ArtifactSource, Catalog, UnpackTarget};
use tracing::debug;

use crate::fs::ScratchDir;

/// One step of a staging run. Steps run strictly in plan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    CreateScratch(ScratchDir),
    Download {
        requests: Vec<DownloadRequest>,
        dest_dir: PathBuf,
    },
    /// Unpack a deb or tarball, feeding its links to the run's ledger.
    ExtractPackage {
        archive: PathBuf,
        kind: ArchiveKind,
        dest: PathBuf,
    },
    RepairSymlinks,
    /// Unzip every file under `search_root` whose name is in `names`.
    UnzipMatching {
        search_root: PathBuf,
        names: Vec<String>,
        dest: PathBuf,
    },
    Unzip {
        archive: PathBuf,
        dest: PathBuf,
    },
    CopyFlatten {
        src_dir: PathBuf,
        extension: String,
        dest: PathBuf,
    },
    CopyTree {
        src: PathBuf,
        dest: PathBuf,
    },
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::CreateScratch(scratch) => {
                write!(f, "create scratch directory {}", scratch.path().display())
            }
            Task::Download { requests, dest_dir } => write!(
                f,
                "download {} file(s) into {}",
                requests.len(),
                dest_dir.display()
            ),
            Task::ExtractPackage { archive, kind, dest } => write!(
                f,
                "extract {} {} into {}",
                kind,
                archive.display(),
                dest.display()
            ),
            Task::RepairSymlinks => f.write_str("repair symlinks"),
            Task::UnzipMatching { names, dest, .. } => {
                write!(f, "unzip {} into {}", names.join(", "), dest.display())
            }
            Task::Unzip { archive, dest } => {
                write!(f, "unzip {} into {}", archive.display(), dest.display())
            }
            Task::CopyFlatten {
                src_dir,
                extension,
                dest,
            } => write!(
                f,
                "copy *.{} from {} into {}",
                extension,
                src_dir.display(),
                dest.display()
            ),
            Task::CopyTree { src, dest } => {
                write!(f, "copy {} into {}", src.display(), dest.display())
            }
        }
    }
}

pub struct TaskPlanner<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
}

impl<'a> TaskPlanner<'a> {
    pub fn new(config: &'a Config, catalog: &'a Catalog) -> Self {
        Self { config, catalog }
    }

    /// Builds the task list that materializes `missing`. Nothing missing
    /// means an empty plan, and no scratch directory is ever created.
    pub fn plan(&self, missing: ArtifactSet, scratch: &ScratchDir) -> Vec<Task> {
        if missing.is_empty() {
            debug!("Nothing missing, empty plan");
            return Vec::new();
        }
        let scratch_path = scratch.path();
        let classes = self.config.classes_dir();
        let layout = &self.catalog.layout;
        let needed: Vec<&ArtifactSource> = self.catalog.needed_sources(missing).collect();
        debug!(
            "Planning for missing [{}] with {} source(s)",
            missing,
            needed.len()
        );

        let mut tasks = vec![Task::CreateScratch(scratch.clone())];
        if !needed.is_empty() {
            tasks.push(Task::Download {
                requests: needed.iter().map(|s| DownloadRequest::from(*s)).collect(),
                dest_dir: scratch_path.to_path_buf(),
            });
        }

        let mut packages = 0;
        for source in needed.iter().filter(|s| s.kind.is_tar_based()) {
            tasks.push(Task::ExtractPackage {
                archive: scratch_path.join(source.file_name()),
                kind: source.kind,
                dest: self.unpack_dir(source, scratch),
            });
            packages += 1;
        }
        if packages > 0 {
            tasks.push(Task::RepairSymlinks);
        }

        if missing.contains(ArtifactSet::CLASS_LIBRARY) {
            tasks.push(Task::UnzipMatching {
                search_root: scratch_path.to_path_buf(),
                names: layout.class_library_jars.clone(),
                dest: classes.clone(),
            });
        }

        for source in needed.iter().filter(|s| s.kind == ArchiveKind::Zip) {
            tasks.push(Task::Unzip {
                archive: scratch_path.join(source.file_name()),
                dest: self.unpack_dir(source, scratch),
            });
        }

        if missing.contains(ArtifactSet::COMPRESSION_SHIM) {
            tasks.push(Task::CopyFlatten {
                src_dir: scratch_path.join(&layout.shim_source_dir),
                extension: "class".to_string(),
                dest: classes.join(&layout.shim_dest_dir),
            });
        }

        if missing.contains(ArtifactSet::RUNTIME_HOME) {
            tasks.push(Task::CopyTree {
                src: scratch_path.join(&layout.jre_subdir),
                dest: self.config.java_home().to_path_buf(),
            });
        }
        tasks
    }

    fn unpack_dir(&self, source: &ArtifactSource, scratch: &ScratchDir) -> PathBuf {
        match &source.unpack {
            UnpackTarget::Scratch => scratch.path().to_path_buf(),
            UnpackTarget::Classes => self.config.classes_dir(),
            UnpackTarget::ScratchSubdir(dir) => scratch.path().join(dir),
        }
    }
}
