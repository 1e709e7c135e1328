// jstage-net/src/http.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use jstage_common::download::{DownloadRequest, Downloader};
use jstage_common::error::{JstageError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use crate::validation::{validate_url, verify_checksum};

const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const MAX_CONCURRENT_DOWNLOADS: usize = 4;
const USER_AGENT_STRING: &str = "jstage java_home stager (Rust)";

/// Downloads a batch concurrently on a private tokio runtime, exposing a
/// blocking interface to the sequential staging pipeline.
pub struct HttpDownloader {
    runtime: Runtime,
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| JstageError::Generic(format!("Failed to start download runtime: {e}")))?;
        Ok(Self {
            runtime,
            client: build_http_client()?,
        })
    }
}

impl Downloader for HttpDownloader {
    fn download_all(&self, requests: &[DownloadRequest], dest_dir: &Path) -> Result<()> {
        fs::create_dir_all(dest_dir).map_err(|e| {
            JstageError::Io(std::sync::Arc::new(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create download directory {}: {}",
                    dest_dir.display(),
                    e
                ),
            )))
        })?;
        for request in requests {
            validate_url(&request.url)?;
        }

        let client = &self.client;
        let outcomes: Vec<(&DownloadRequest, Result<PathBuf>)> = self.runtime.block_on(
            stream::iter(requests)
                .map(|request| async move {
                    let result = fetch_one(client, request, dest_dir).await;
                    (request, result)
                })
                .buffer_unordered(MAX_CONCURRENT_DOWNLOADS)
                .collect(),
        );

        let mut failures: Vec<(&DownloadRequest, JstageError)> = outcomes
            .into_iter()
            .filter_map(|(request, result)| result.err().map(|e| (request, e)))
            .collect();
        if failures.len() <= 1 {
            return match failures.pop() {
                Some((_, err)) => Err(err),
                None => Ok(()),
            };
        }

        let urls = failures
            .iter()
            .map(|(r, _)| r.url.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let reasons = failures
            .iter()
            .map(|(r, e)| format!("{}: {}", r.file_name, e))
            .collect::<Vec<_>>()
            .join("; ");
        Err(JstageError::DownloadError(
            format!("{} of {} files", failures.len(), requests.len()),
            urls,
            reasons,
        ))
    }
}

fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| JstageError::HttpError(format!("Failed to build HTTP client: {e}")))
}

async fn fetch_one(client: &Client, request: &DownloadRequest, dest_dir: &Path) -> Result<PathBuf> {
    let final_path = request.destination(dest_dir);

    if final_path.is_file() {
        match request.sha256.as_deref() {
            None => {
                info!("Reusing downloaded {}", request.file_name);
                return Ok(final_path);
            }
            Some(expected) => match verify_checksum(&final_path, expected) {
                Ok(()) => {
                    info!("Reusing verified download {}", request.file_name);
                    return Ok(final_path);
                }
                Err(e) => {
                    debug!(
                        "Existing file checksum mismatch ({}): {}. Redownloading.",
                        final_path.display(),
                        e
                    );
                    let _ = fs::remove_file(&final_path);
                }
            },
        }
    }

    info!("Downloading {}", request.url);
    download_and_verify(client, request, &final_path).await
}

async fn download_and_verify(
    client: &Client,
    request: &DownloadRequest,
    final_path: &Path,
) -> Result<PathBuf> {
    let url = request.url.as_str();
    let temp_path = final_path.with_file_name(format!(".{}.download", request.file_name));
    debug!("Downloading to temporary path: {}", temp_path.display());
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let response = client.get(url).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        JstageError::HttpError(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        error!("HTTP error {} for URL {}", status, url);
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            other => format!("HTTP error {other}"),
        };
        return Err(JstageError::DownloadError(
            request.file_name.clone(),
            url.to_string(),
            reason,
        ));
    }

    let mut temp_file = TokioFile::create(&temp_path).await.map_err(|e| {
        JstageError::Io(std::sync::Arc::new(std::io::Error::new(
            e.kind(),
            format!("Failed to create temp file {}: {}", temp_path.display(), e),
        )))
    })?;
    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            JstageError::DownloadError(
                request.file_name.clone(),
                url.to_string(),
                format!("Failed to read response body: {e}"),
            )
        })?;
        temp_file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    temp_file.flush().await?;
    drop(temp_file);
    debug!("Wrote {} bytes to {}", written, temp_path.display());

    if let Some(expected) = request.sha256.as_deref() {
        if let Err(e) = verify_checksum(&temp_path, expected) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    }

    fs::rename(&temp_path, final_path)?;
    debug!(
        "Moved downloaded file to final location: {}",
        final_path.display()
    );
    Ok(final_path.to_path_buf())
}
