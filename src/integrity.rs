use crate::digest::{FileDigest, StreamHasher};
use crate::error::{Result, SplitStitchError};
use crate::manifest::Manifest;
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

/// Compare a freshly computed digest against the recorded one
pub fn verify_digest(expected: &FileDigest, actual: &FileDigest) -> Result<()> {
    if expected.as_bytes() != actual.as_bytes() {
        return Err(SplitStitchError::DigestMismatch {
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        });
    }
    Ok(())
}

pub fn verify_size(expected: u64, actual: u64) -> Result<()> {
    if expected != actual {
        return Err(SplitStitchError::SizeMismatch { expected, actual });
    }
    Ok(())
}

/// Outcome of checking a parts set without reassembling it
#[derive(Debug, Clone, Serialize)]
pub struct PartsCheck {
    pub parts: Vec<PathBuf>,
    pub total_size: u64,
    pub sha256: FileDigest,
}

/// Stream every part in index order through one hasher and check the
/// concatenation against the manifest. Nothing is written.
pub fn check_parts(manifest: &Manifest) -> Result<PartsCheck> {
    let parts = manifest.part_paths()?;
    let mut hasher = StreamHasher::new();

    for path in &parts {
        let mut file = File::open(path).map_err(|source| SplitStitchError::PartUnreadable {
            path: path.clone(),
            source,
        })?;
        let read = hasher
            .update_reader(&mut file)
            .map_err(|source| SplitStitchError::PartUnreadable {
                path: path.clone(),
                source,
            })?;
        debug!(part = %path.display(), bytes = read, "hashed part");
    }

    let total_size = hasher.bytes_hashed();
    verify_size(manifest.total_size, total_size)?;

    let sha256 = hasher.finalize();
    verify_digest(&manifest.sha256, &sha256)?;

    Ok(PartsCheck {
        parts,
        total_size,
        sha256,
    })
}
