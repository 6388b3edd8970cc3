use crate::error::Result;
use crate::integrity::{check_parts, PartsCheck};
use crate::manifest::{read_manifest, Manifest};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub manifest: Manifest,
    pub check: PartsCheck,
}

/// Check that the parts named by a manifest would stitch cleanly.
/// Read-only: no temp file, no backup, nothing deleted.
pub fn verify_manifest(manifest_path: &Path) -> Result<VerifyReport> {
    let manifest = read_manifest(manifest_path)?;
    info!(
        original = %manifest.original_file,
        parts = manifest.parts,
        "verifying parts"
    );
    let check = check_parts(&manifest)?;
    Ok(VerifyReport { manifest, check })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::split::{split_file, SplitOptions};
    use crate::error::SplitStitchError;
    use tempfile::tempdir;

    #[test]
    fn test_verify_is_read_only() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.bin");
        std::fs::write(&input, b"some bytes to verify").unwrap();
        let split = split_file(&input, &SplitOptions { part_size: 8 }).unwrap();

        let report = verify_manifest(&split.manifest_path).unwrap();
        assert_eq!(report.check.total_size, 20);
        assert_eq!(report.check.sha256, split.manifest.sha256);
        for part in &split.part_paths {
            assert!(part.exists());
        }
        assert!(!dir.path().join("data.bin.tmp").exists());
    }

    #[test]
    fn test_verify_detects_corruption() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.bin");
        std::fs::write(&input, b"some bytes to verify").unwrap();
        let split = split_file(&input, &SplitOptions { part_size: 8 }).unwrap();

        let mut bytes = std::fs::read(&split.part_paths[2]).unwrap();
        bytes[0] ^= 0x01;
        std::fs::write(&split.part_paths[2], bytes).unwrap();

        let err = verify_manifest(&split.manifest_path).unwrap_err();
        assert!(matches!(err, SplitStitchError::DigestMismatch { .. }));
    }
}
