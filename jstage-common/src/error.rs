use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum JstageError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("Catalog Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("JSON Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("Checksum Mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    /// The `ar` container has no `data.tar.*` member at all.
    #[error("Could not find data.tar.gz or data.tar.xz in {}", .archive.display())]
    MissingPayload { archive: PathBuf },

    /// The package payload uses a compression scheme we cannot decode.
    #[error(
        "Debian archive {} uses an unsupported payload compression '{scheme}'",
        .archive.display()
    )]
    UnsupportedCompression { archive: PathBuf, scheme: String },

    #[error("Failed to decode payload of {}: {reason}", .archive.display())]
    DecodeFailure { archive: PathBuf, reason: String },

    #[error("Failed to extract {} while writing {}: {source}", .archive.display(), .path.display())]
    ExtractionIo {
        archive: PathBuf,
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    #[error("Unsafe entry path '{}' in {}", .entry.display(), .archive.display())]
    UnsafePath { archive: PathBuf, entry: PathBuf },

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl JstageError {
    pub fn extraction_io(archive: &Path, path: &Path, err: std::io::Error) -> Self {
        JstageError::ExtractionIo {
            archive: archive.to_path_buf(),
            path: path.to_path_buf(),
            source: Arc::new(err),
        }
    }

    pub fn decode(archive: &Path, reason: impl std::fmt::Display) -> Self {
        JstageError::DecodeFailure {
            archive: archive.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for JstageError {
    fn from(err: std::io::Error) -> Self {
        JstageError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for JstageError {
    fn from(err: reqwest::Error) -> Self {
        JstageError::Http(Arc::new(err))
    }
}

impl From<toml::de::Error> for JstageError {
    fn from(err: toml::de::Error) -> Self {
        JstageError::Toml(Arc::new(err))
    }
}

impl From<serde_json::Error> for JstageError {
    fn from(err: serde_json::Error) -> Self {
        JstageError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, JstageError>;
