// jstage-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::Result;

const DEFAULT_JAVA_HOME: &str = "java_home";
const SCRATCH_PREFIX: &str = "jdk-download";

#[derive(Debug, Clone)]
pub struct Config {
    pub java_home: PathBuf,
    /// Parent of freshly created scratch directories.
    pub scratch_parent: PathBuf,
    /// A fixed scratch directory to reuse instead of creating a new one.
    pub scratch_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading jstage configuration");

        let java_home = env::var("JSTAGE_JAVA_HOME")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                debug!(
                    "JSTAGE_JAVA_HOME not set or empty, falling back to default: {}",
                    DEFAULT_JAVA_HOME
                );
                PathBuf::from(DEFAULT_JAVA_HOME)
            });
        let java_home = absolutize(&java_home)?;
        debug!("Effective java_home set to: {}", java_home.display());

        let scratch_parent = env::var("JSTAGE_SCRATCH_PARENT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);
        let scratch_dir = non_empty_path_var("JSTAGE_SCRATCH_DIR");
        let catalog_path = non_empty_path_var("JSTAGE_CATALOG");

        debug!("Configuration loaded successfully.");
        Ok(Self {
            java_home,
            scratch_parent,
            scratch_dir,
            catalog_path,
        })
    }

    /// A configuration rooted at `java_home` with no reuse of scratch state.
    pub fn for_java_home(java_home: impl Into<PathBuf>) -> Self {
        Self {
            java_home: java_home.into(),
            scratch_parent: env::temp_dir(),
            scratch_dir: None,
            catalog_path: None,
        }
    }

    pub fn with_java_home(mut self, java_home: &Path) -> Result<Self> {
        self.java_home = absolutize(java_home)?;
        Ok(self)
    }

    pub fn with_scratch_dir(mut self, scratch_dir: &Path) -> Self {
        self.scratch_dir = Some(scratch_dir.to_path_buf());
        self
    }

    pub fn with_catalog(mut self, catalog: &Path) -> Self {
        self.catalog_path = Some(catalog.to_path_buf());
        self
    }

    pub fn java_home(&self) -> &Path {
        &self.java_home
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.java_home.join("classes")
    }

    pub fn scratch_prefix(&self) -> &'static str {
        SCRATCH_PREFIX
    }
}

fn non_empty_path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
