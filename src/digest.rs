//! Streaming SHA-256 over whole files.
//!
//! Memory use is bounded by [`BUF_SIZE`] no matter how large the input is,
//! so the same code hashes a 10 byte file and a 40 GB disk image.

use crate::error::{Result, SplitStitchError};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size for hashing and copying
pub const BUF_SIZE: usize = 64 * 1024;

/// Digest length in bytes
pub const DIGEST_LEN: usize = 32;

/// A 32-byte SHA-256 digest of a file's full content
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileDigest([u8; DIGEST_LEN]);

impl FileDigest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase 64-character hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileDigest({})", self.to_hex())
    }
}

impl std::str::FromStr for FileDigest {
    type Err = SplitStitchError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(SplitStitchError::InvalidManifest(format!(
                "sha256 must be {} hex characters, got {}",
                DIGEST_LEN * 2,
                s.len()
            )));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| {
            SplitStitchError::InvalidManifest(format!("sha256 is not valid hex: {}", e))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for FileDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Incremental hasher that can be fed from several readers in sequence
#[derive(Default)]
pub struct StreamHasher {
    inner: Sha256,
    bytes: u64,
}

impl StreamHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.bytes += data.len() as u64;
    }

    /// Drain `reader` through the hasher, returning the number of bytes read
    pub fn update_reader<R: Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        let mut buffer = vec![0u8; BUF_SIZE];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.update(&buffer[..n]);
            total += n as u64;
        }
        Ok(total)
    }

    /// Bytes fed so far
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    pub fn finalize(self) -> FileDigest {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&self.inner.finalize());
        FileDigest(bytes)
    }
}

/// Hash a file's full content
pub fn hash_file(path: &Path) -> Result<FileDigest> {
    let mut file = File::open(path)?;
    let mut hasher = StreamHasher::new();
    hasher.update_reader(&mut file)?;
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // sha256("")
    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    // sha256("abc")
    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_hash_known_vectors() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty");
        let abc = dir.path().join("abc");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&abc, b"abc").unwrap();

        assert_eq!(hash_file(&empty).unwrap().to_hex(), EMPTY);
        assert_eq!(hash_file(&abc).unwrap().to_hex(), ABC);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..(3 * BUF_SIZE + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let first = hash_file(&path).unwrap();
        let second = hash_file(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chained_readers_match_whole_file() {
        let data: Vec<u8> = (0..100_000).map(|i| (i * 7 % 256) as u8).collect();

        let mut whole = StreamHasher::new();
        whole.update(&data);

        let mut split = StreamHasher::new();
        for chunk in data.chunks(30_000) {
            split.update_reader(&mut &chunk[..]).unwrap();
        }

        assert_eq!(split.bytes_hashed(), data.len() as u64);
        assert_eq!(whole.finalize(), split.finalize());
    }

    #[test]
    fn test_hash_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = hash_file(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SplitStitchError::Io(_)));
    }

    #[test]
    fn test_parse_digest() {
        let digest: FileDigest = ABC.parse().unwrap();
        assert_eq!(digest.to_string(), ABC);

        let upper: FileDigest = ABC.to_uppercase().parse().unwrap();
        assert_eq!(upper, digest);

        assert!("abc".parse::<FileDigest>().is_err());
        let bad = "z".repeat(64);
        assert!(bad.parse::<FileDigest>().is_err());
    }
}
