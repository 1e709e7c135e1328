// jstage-common/src/lib.rs
pub mod config;
pub mod download;
pub mod error;
pub mod model;

// Re-export key types
pub use config::Config;
pub use download::{DownloadRequest, Downloader};
pub use error::{JstageError, Result};
pub use model::{ArchiveKind, ArtifactSet, ArtifactSource, Catalog};
