// jstage-core/src/extract/decompress.rs
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use jstage_common::error::{JstageError, Result};
use xz2::read::XzDecoder;

const PAYLOAD_PREFIX: &str = "data.tar";

/// Compression schemes a package payload can be decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadCompression {
    Gzip,
    Xz,
}

impl PayloadCompression {
    /// Classifies an `ar` member name.
    ///
    /// Returns `None` for members that are not a package payload at all,
    /// `Some(Err(scheme))` for payloads in a scheme we cannot decode (`"none"`
    /// for an uncompressed `data.tar`).
    pub fn classify(member_name: &str) -> Option<std::result::Result<Self, String>> {
        let rest = member_name.strip_prefix(PAYLOAD_PREFIX)?;
        let scheme = match rest {
            "" => return Some(Err("none".to_string())),
            _ => rest.strip_prefix('.')?,
        };
        Some(match scheme {
            "gz" => Ok(Self::Gzip),
            "xz" => Ok(Self::Xz),
            other => Err(other.to_string()),
        })
    }
}

/// Inflates a gzip payload held in memory, including concatenated members.
pub fn inflate_gzip(bytes: &[u8], archive: &Path) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len().saturating_mul(4));
    MultiGzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| JstageError::decode(archive, format!("gzip: {e}")))?;
    Ok(out)
}

/// Wraps `reader` in a streaming xz decoder that accepts concatenated streams.
pub fn xz_reader<R: Read>(reader: R) -> XzDecoder<R> {
    XzDecoder::new_multi_decoder(reader)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use xz2::write::XzEncoder;

    use super::*;

    #[test]
    fn classifies_payload_members() {
        assert_eq!(
            PayloadCompression::classify("data.tar.gz"),
            Some(Ok(PayloadCompression::Gzip))
        );
        assert_eq!(
            PayloadCompression::classify("data.tar.xz"),
            Some(Ok(PayloadCompression::Xz))
        );
        assert_eq!(
            PayloadCompression::classify("data.tar.zst"),
            Some(Err("zst".to_string()))
        );
        assert_eq!(
            PayloadCompression::classify("data.tar"),
            Some(Err("none".to_string()))
        );
        assert_eq!(PayloadCompression::classify("control.tar.gz"), None);
        assert_eq!(PayloadCompression::classify("debian-binary"), None);
        assert_eq!(PayloadCompression::classify("data.tarball"), None);
    }

    #[test]
    fn corrupt_gzip_is_a_decode_failure() {
        let err = inflate_gzip(b"definitely not gzip", Path::new("x.deb")).unwrap_err();
        match err {
            JstageError::DecodeFailure { archive, .. } => assert_eq!(archive, Path::new("x.deb")),
            other => panic!("unexpected error {other:?}"),
        }

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"payload").unwrap();
        let gz = enc.finish().unwrap();
        assert_eq!(inflate_gzip(&gz, Path::new("x.deb")).unwrap(), b"payload");
    }

    #[test]
    fn inflate_gzip_reads_concatenated_members() {
        let mut joined = Vec::new();
        for part in [&b"first "[..], &b"second"[..]] {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(part).unwrap();
            joined.extend(enc.finish().unwrap());
        }
        assert_eq!(
            inflate_gzip(&joined, Path::new("x.deb")).unwrap(),
            b"first second"
        );
    }

    #[test]
    fn xz_reader_reads_concatenated_streams() {
        let mut joined = Vec::new();
        for part in [&b"first "[..], &b"second"[..]] {
            let mut enc = XzEncoder::new(Vec::new(), 6);
            enc.write_all(part).unwrap();
            joined.extend(enc.finish().unwrap());
        }
        let mut out = String::new();
        xz_reader(&joined[..]).read_to_string(&mut out).unwrap();
        assert_eq!(out, "first second");
    }
}
