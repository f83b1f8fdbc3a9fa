//! Fingerprints of raw files read during ingestion.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What ingestion learned about one raw file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFile {
    pub path: PathBuf,
    /// `sha256:<hex>` of the bytes on disk, before decoding.
    pub digest: String,
    pub bytes: u64,
    pub delimiter: char,
    /// `utf-8`, or `latin-1` when the file was not valid UTF-8.
    pub encoding: String,
    pub rows: usize,
    pub columns: usize,
    pub read_at: DateTime<Utc>,
}

impl RawFile {
    pub(crate) fn fingerprint(path: &Path, contents: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            digest: format!("sha256:{:x}", Sha256::digest(contents)),
            bytes: contents.len() as u64,
            delimiter: ',',
            encoding: String::from("utf-8"),
            rows: 0,
            columns: 0,
            read_at: Utc::now(),
        }
    }

    /// File name without its directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_digest_is_stable() {
        let a = RawFile::fingerprint(Path::new("/data/orders.csv"), b"id\n1\n");
        let b = RawFile::fingerprint(Path::new("/elsewhere/orders.csv"), b"id\n1\n");
        assert_eq!(a.digest, b.digest);
        assert!(a.digest.starts_with("sha256:"));
        assert_eq!(a.bytes, 5);
        assert_eq!(a.file_name(), "orders.csv");
    }
}
