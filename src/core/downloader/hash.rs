use std::path::Path;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Md5,
}

/// An expected digest; the algorithm is inferred from its hex length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl ContentHash {
    /// 64 hex chars → SHA-256, 32 → MD5, anything else is treated as SHA-1.
    pub fn new(hex: &str) -> Self {
        let hex = hex.trim().to_ascii_lowercase();
        let algorithm = match hex.len() {
            64 => HashAlgorithm::Sha256,
            32 => HashAlgorithm::Md5,
            _ => HashAlgorithm::Sha1,
        };
        Self { algorithm, hex }
    }

    /// `None` for missing or blank hashes.
    pub fn from_opt(hex: Option<&str>) -> Option<Self> {
        hex.map(str::trim).filter(|h| !h.is_empty()).map(Self::new)
    }

    pub fn digest(&self, bytes: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
        }
    }

    /// Stream `path` through the matching hasher.
    pub async fn hash_file(&self, path: &Path) -> LauncherResult<String> {
        match self.algorithm {
            HashAlgorithm::Sha1 => stream_digest::<Sha1>(path).await,
            HashAlgorithm::Sha256 => stream_digest::<Sha256>(path).await,
            HashAlgorithm::Md5 => stream_digest::<Md5>(path).await,
        }
    }

    /// Compare the file against this hash, returning the actual digest on mismatch.
    pub async fn verify_file(&self, path: &Path) -> LauncherResult<Result<(), String>> {
        let actual = self.hash_file(path).await?;
        if actual == self.hex {
            Ok(Ok(()))
        } else {
            Ok(Err(actual))
        }
    }
}

async fn stream_digest<D: Digest>(path: &Path) -> LauncherResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await.map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_from_length() {
        assert_eq!(ContentHash::new(&"a".repeat(40)).algorithm, HashAlgorithm::Sha1);
        assert_eq!(ContentHash::new(&"a".repeat(64)).algorithm, HashAlgorithm::Sha256);
        assert_eq!(ContentHash::new(&"a".repeat(32)).algorithm, HashAlgorithm::Md5);
        assert_eq!(ContentHash::new("abc123").algorithm, HashAlgorithm::Sha1);
        assert!(ContentHash::from_opt(Some("  ")).is_none());
    }

    #[test]
    fn known_digests() {
        let sha1 = ContentHash::new("A9993E364706816ABA3E25717850C26C9CD0D89D");
        assert_eq!(sha1.digest(b"abc"), sha1.hex);
        let md5 = ContentHash::new("900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(md5.digest(b"abc"), md5.hex);
    }

    #[tokio::test]
    async fn file_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"abc").unwrap();

        let good = ContentHash::new("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(good.verify_file(&path).await.unwrap(), Ok(()));

        let bad = ContentHash::new("abc123");
        let actual = bad.verify_file(&path).await.unwrap().unwrap_err();
        assert_eq!(actual, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }
}
