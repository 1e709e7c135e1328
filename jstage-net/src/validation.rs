// jstage-net/src/validation.rs
use std::fs::File;
use std::io;
use std::path::Path;

use jstage_common::error::{JstageError, Result};
use sha2::{Digest, Sha256};
use url::Url;

pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    tracing::debug!("Verifying checksum for: {}", path.display());
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let bytes_copied = io::copy(&mut file, &mut hasher)?;
    let actual = hex::encode(hasher.finalize());
    tracing::debug!(
        "Calculated SHA256: {} ({} bytes read)",
        actual,
        bytes_copied
    );
    tracing::debug!("Expected SHA256:   {}", expected);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(JstageError::ChecksumMismatch(format!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        )))
    }
}

/// Validates a URL, ensuring it uses a scheme the HTTP client can fetch.
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).map_err(|e| {
        JstageError::ValidationError(format!("Failed to parse URL '{url_str}': {e}"))
    })?;
    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(JstageError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': must be http or https, but got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn accepts_http_and_https_only() {
        assert!(validate_url("https://example.org/a.deb").is_ok());
        assert!(validate_url("http://security.ubuntu.com/ubuntu/pool/a.deb").is_ok());
        assert!(matches!(
            validate_url("ftp://example.org/a.deb"),
            Err(JstageError::ValidationError(_))
        ));
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn checksum_matches_file_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        file.flush().unwrap();
        // sha256("hello")
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert!(verify_checksum(file.path(), expected).is_ok());
        assert!(verify_checksum(file.path(), &expected.to_uppercase()).is_ok());
        assert!(matches!(
            verify_checksum(file.path(), "00"),
            Err(JstageError::ChecksumMismatch(_))
        ));
    }
}
