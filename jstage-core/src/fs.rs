// jstage-core/src/fs.rs
//! Path and directory helpers shared by the extractors and the pipeline.
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use jstage_common::config::Config;
use jstage_common::error::{JstageError, Result};
use tracing::{debug, error};
use walkdir::WalkDir;

/// Resolves `.` and `..` without touching the filesystem, like `path.resolve`
/// does for absolute inputs. `..` never climbs above the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Component::RootDir) | None) {
                    out.pop();
                }
            }
            Component::Normal(p) => out.push(p),
        }
    }
    out
}

/// Copies a file or a whole tree from `src` to `dest`, overwriting files that
/// already exist. Symlinks inside `src` are followed so that `dest` only ever
/// receives real content.
pub fn copy_recursive(src: &Path, dest: &Path) -> io::Result<u64> {
    let meta = fs::metadata(src)?;
    if meta.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        return fs::copy(src, dest);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copied += fs::copy(entry.path(), &target)?;
        }
    }
    Ok(copied)
}

/// Copies every file directly inside `src_dir` whose extension is `extension`
/// into `dest_dir`, dropping any directory structure. Returns the copied count.
pub fn copy_flatten(src_dir: &Path, extension: &str, dest_dir: &Path) -> Result<usize> {
    debug!(
        "Copying *.{} from {} to {}",
        extension,
        src_dir.display(),
        dest_dir.display()
    );
    fs::create_dir_all(dest_dir)?;
    let mut count = 0;
    for entry in fs::read_dir(src_dir).map_err(|e| {
        error!("Failed to read directory {}: {}", src_dir.display(), e);
        JstageError::from(e)
    })? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            fs::copy(&path, dest_dir.join(entry.file_name()))?;
            count += 1;
        }
    }
    Ok(count)
}

/// Walks `root` and returns every regular file whose name is one of `names`,
/// in sorted path order.
pub fn find_files_named(root: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| JstageError::Generic(format!(
            "Failed to walk {}: {}",
            root.display(),
            e
        )))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if names.iter().any(|n| n == name.as_ref()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// The per-run directory holding downloads and unpacked packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    path: PathBuf,
    reused: bool,
}

impl ScratchDir {
    /// Picks the scratch path for this run without creating it: the configured
    /// directory when there is one, otherwise a fresh randomly named directory.
    pub fn choose(config: &Config) -> Self {
        match &config.scratch_dir {
            Some(path) => Self {
                path: path.clone(),
                reused: true,
            },
            None => {
                let suffix: u32 = rand::random();
                Self {
                    path: config
                        .scratch_parent
                        .join(format!("{}{:08x}", config.scratch_prefix(), suffix)),
                    reused: false,
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_reused(&self) -> bool {
        self.reused
    }

    /// Creates the directory. A fresh directory must not exist yet.
    pub fn create(&self) -> Result<()> {
        debug!("Creating scratch directory {}", self.path.display());
        let res = if self.reused {
            fs::create_dir_all(&self.path)
        } else {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::create_dir(&self.path)
        };
        res.map_err(|e| {
            error!("Failed create scratch dir {}: {}", self.path.display(), e);
            JstageError::from(e)
        })
    }
}

/// Deletes the staged java_home tree.
pub fn remove_java_home(java_home: &Path) -> Result<bool> {
    match fs::remove_dir_all(java_home) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            error!("Failed remove dir_all {}: {}", java_home.display(), e);
            Err(JstageError::from(e))
        }
    }
}
