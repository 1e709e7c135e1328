// jstage-common/src/model/catalog.rs
//! The fixed list of inputs for one JDK release line. Switching to another
//! JDK release means editing (or loading) a catalog, not touching extraction code.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::artifact::{ArchiveKind, ArtifactSet, ArtifactSource, SentinelTable, UnpackTarget};
use crate::error::{JstageError, Result};

const OPENJDK6_DEBS_DOMAIN: &str = "http://security.ubuntu.com/ubuntu/pool/main/o/openjdk-6/";
const OPENJDK6_DEBS: [&str; 3] = [
    "openjdk-6-jdk_6b33-1.13.5-1ubuntu0.12.04_i386.deb",
    "openjdk-6-jre-headless_6b33-1.13.5-1ubuntu0.12.04_i386.deb",
    "openjdk-6-jre-lib_6b33-1.13.5-1ubuntu0.12.04_all.deb",
];
const TZDATA_DOMAIN: &str = "http://security.ubuntu.com/ubuntu/pool/main/t/tzdata/";
const TZDATA_DEB: &str = "tzdata-java_2014e-0ubuntu0.13.10_all.deb";
const ECJ_URL: &str = "http://www.eclipse.org/downloads/download.php?file=/eclipse/downloads/drops/R-3.7.1-201109091335/ecj-3.7.1.jar";
const JAZZLIB_URL: &str =
    "http://downloads.sourceforge.net/project/jazzlib/jazzlib/0.07/jazzlib-binary-0.07-juz.zip";

/// Where things live once the packages are unpacked into scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Scratch-relative directory holding the packaged JRE.
    pub jre_subdir: PathBuf,
    /// Jar file names (searched anywhere under scratch) unzipped into `classes/`.
    pub class_library_jars: Vec<String>,
    /// Scratch-relative directory with the compression shim's class files.
    pub shim_source_dir: PathBuf,
    /// `classes/`-relative destination of the shim classes.
    pub shim_dest_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub release: String,
    pub sources: Vec<ArtifactSource>,
    pub layout: Layout,
    #[serde(default)]
    pub sentinels: SentinelTable,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::openjdk6()
    }
}

impl Catalog {
    /// OpenJDK 6 as shipped in the Ubuntu 12.04 security pool, plus the ECJ
    /// compiler and the Jazzlib compression classes.
    pub fn openjdk6() -> Self {
        let mut sources: Vec<ArtifactSource> = OPENJDK6_DEBS
            .iter()
            .map(|deb| {
                ArtifactSource::deb(
                    OPENJDK6_DEBS_DOMAIN,
                    deb,
                    ArtifactSet::CLASS_LIBRARY | ArtifactSet::RUNTIME_HOME,
                )
            })
            .collect();
        sources.push(ArtifactSource::deb(
            TZDATA_DOMAIN,
            TZDATA_DEB,
            ArtifactSet::RUNTIME_HOME,
        ));
        sources.push(
            ArtifactSource::new("ecj", ECJ_URL, ArchiveKind::Zip, ArtifactSet::COMPILER)
                .with_file_name("ecj-3.7.1.jar")
                .with_unpack(UnpackTarget::Classes),
        );
        sources.push(
            ArtifactSource::new(
                "jazzlib",
                JAZZLIB_URL,
                ArchiveKind::Zip,
                ArtifactSet::COMPRESSION_SHIM,
            )
            .with_unpack(UnpackTarget::ScratchSubdir(PathBuf::from("jazzlib"))),
        );

        Self {
            release: "openjdk-6".to_string(),
            sources,
            layout: Layout {
                jre_subdir: PathBuf::from("usr/lib/jvm/java-6-openjdk-i386/jre"),
                class_library_jars: ["rt", "tools", "resources", "rhino", "jsse"]
                    .iter()
                    .map(|name| format!("{name}.jar"))
                    .collect(),
                shim_source_dir: PathBuf::from("jazzlib/java/util/zip"),
                shim_dest_dir: PathBuf::from("java/util/zip"),
            },
            sentinels: SentinelTable::default(),
        }
    }

    /// Loads a TOML catalog, or the built-in one when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("Using built-in openjdk-6 catalog");
            return Ok(Self::default());
        };
        debug!("Loading catalog from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| {
            JstageError::Config(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.file_name()) {
                return Err(JstageError::Config(format!(
                    "Catalog '{}' has two sources downloading to '{}'",
                    self.release,
                    source.file_name()
                )));
            }
            if source.feeds.is_empty() {
                return Err(JstageError::Config(format!(
                    "Catalog source '{}' does not feed any artifact",
                    source.id
                )));
            }
        }
        Ok(())
    }

    /// Sources that have to be fetched to stage `missing`.
    pub fn needed_sources(&self, missing: ArtifactSet) -> impl Iterator<Item = &ArtifactSource> {
        self.sources
            .iter()
            .filter(move |source| source.is_needed_for(missing))
    }
}
