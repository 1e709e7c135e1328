// jstage-common/src/model/artifact.rs
use std::fmt;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The independently materialized parts of a java_home tree.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ArtifactSet: u8 {
        /// The Java class library unpacked into `classes/`.
        const CLASS_LIBRARY    = 0b00000001;
        /// The ECJ batch compiler classes.
        const COMPILER         = 0b00000010;
        /// Pure-Java replacements for the `java.util.zip` codec classes.
        const COMPRESSION_SHIM = 0b00000100;
        /// The packaged JRE layout (`lib/`, timezone data, ...).
        const RUNTIME_HOME     = 0b00001000;
    }
}

impl ArtifactSet {
    /// Human names of the contained classes, in flag order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for (flag, name) in [
            (Self::CLASS_LIBRARY, "class-library"),
            (Self::COMPILER, "compiler"),
            (Self::COMPRESSION_SHIM, "compression-shim"),
            (Self::RUNTIME_HOME, "runtime-home"),
        ] {
            if self.contains(flag) {
                names.push(name);
            }
        }
        names
    }
}

impl fmt::Display for ArtifactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", self.names().join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveKind {
    #[serde(rename = "deb")]
    Deb,
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.xz")]
    TarXz,
}

impl ArchiveKind {
    /// Kinds that are unpacked through the tar extractor and feed the symlink ledger.
    pub fn is_tar_based(&self) -> bool {
        matches!(self, Self::Deb | Self::TarGz | Self::TarXz)
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deb => "deb",
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
        };
        f.write_str(s)
    }
}

/// Where a downloaded archive gets unpacked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnpackTarget {
    /// The scratch directory root. Debian packages land here so their `/usr/...`
    /// layout is rebuilt under scratch.
    #[default]
    Scratch,
    /// `<java_home>/classes`.
    Classes,
    /// A named subdirectory of the scratch directory.
    ScratchSubdir(PathBuf),
}

/// One downloadable input of the staging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSource {
    pub id: String,
    pub url: String,
    pub kind: ArchiveKind,
    /// The artifact classes that cannot be materialized without this source.
    pub feeds: ArtifactSet,
    /// Overrides the file name derived from the URL (for URLs whose last path
    /// segment is a script, e.g. `download.php?file=...`).
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub unpack: UnpackTarget,
}

impl ArtifactSource {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        kind: ArchiveKind,
        feeds: ArtifactSet,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            kind,
            feeds,
            file_name: None,
            sha256: None,
            unpack: UnpackTarget::default(),
        }
    }

    /// A Debian package from a pool `domain` (which must end with `/`).
    pub fn deb(domain: &str, package_file: &str, feeds: ArtifactSet) -> Self {
        let id = package_file
            .split('_')
            .next()
            .unwrap_or(package_file)
            .to_string();
        Self::new(id, format!("{domain}{package_file}"), ArchiveKind::Deb, feeds)
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_unpack(mut self, unpack: UnpackTarget) -> Self {
        self.unpack = unpack;
        self
    }

    /// The name the download collaborator stores this source under.
    pub fn file_name(&self) -> String {
        if let Some(name) = &self.file_name {
            return name.clone();
        }
        let path = url::Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.url.clone());
        path.rsplit('/')
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-download", self.id))
    }

    pub fn is_needed_for(&self, missing: ArtifactSet) -> bool {
        self.feeds.intersects(missing)
    }
}

/// Well-known files whose presence means an artifact class is materialized.
/// Paths are relative to java_home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelTable {
    pub class_library: PathBuf,
    pub compiler: PathBuf,
    pub compression_shim: PathBuf,
    pub runtime_home: PathBuf,
}

impl Default for SentinelTable {
    fn default() -> Self {
        Self {
            class_library: PathBuf::from("classes/java/lang/Object.class"),
            compiler: PathBuf::from("classes/org/eclipse/jdt/internal/compiler/batch/Main.class"),
            compression_shim: PathBuf::from("classes/java/util/zip/DeflaterEngine.class"),
            runtime_home: PathBuf::from("lib/zi/ZoneInfoMappings"),
        }
    }
}

impl SentinelTable {
    pub fn entries(&self) -> [(ArtifactSet, &Path); 4] {
        [
            (ArtifactSet::CLASS_LIBRARY, self.class_library.as_path()),
            (ArtifactSet::COMPILER, self.compiler.as_path()),
            (ArtifactSet::COMPRESSION_SHIM, self.compression_shim.as_path()),
            (ArtifactSet::RUNTIME_HOME, self.runtime_home.as_path()),
        ]
    }
}
