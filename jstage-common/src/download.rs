// jstage-common/src/download.rs
//! The seam between the staging pipeline and whatever fetches bytes from the network.
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ArtifactSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Stored as `<dest_dir>/<file_name>`.
    pub file_name: String,
    pub sha256: Option<String>,
}

impl DownloadRequest {
    pub fn destination(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(&self.file_name)
    }
}

impl From<&ArtifactSource> for DownloadRequest {
    fn from(source: &ArtifactSource) -> Self {
        Self {
            url: source.url.clone(),
            file_name: source.file_name(),
            sha256: source.sha256.clone(),
        }
    }
}

/// Fetches a batch of URLs into one directory.
///
/// Implementations guarantee that every request's file exists at
/// [`DownloadRequest::destination`] when `Ok` is returned, and report a failure
/// of any part of the batch as a single error.
pub trait Downloader {
    fn download_all(&self, requests: &[DownloadRequest], dest_dir: &Path) -> Result<()>;
}
