//! Names of the files that live next to an original file.
//!
//! ```text
//! data.bin             original (replaced on stitch)
//! data.bin.part0000    first part
//! data.bin.partNNNN    last part
//! data.bin.manifest    manifest
//! data.bin.tmp         reconstruction scratch file
//! data.bin.bkp         previous content, kept after a stitch
//! ```

use crate::error::{Result, SplitStitchError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Part indices are four zero-padded digits, so 0000..=9999
pub const MAX_PARTS: u64 = 10_000;

/// Longest file name component most filesystems accept
pub const MAX_FILE_NAME_LEN: usize = 255;

pub const MANIFEST_SUFFIX: &str = ".manifest";
pub const TEMP_SUFFIX: &str = ".tmp";
pub const BACKUP_SUFFIX: &str = ".bkp";

/// `<original>.partNNNN`
pub fn part_path(original: &Path, index: u64) -> Result<PathBuf> {
    if index >= MAX_PARTS {
        return Err(SplitStitchError::TooManyParts {
            parts: index + 1,
            max: MAX_PARTS,
        });
    }
    sibling(original, &format!(".part{:04}", index))
}

pub fn manifest_path(original: &Path) -> Result<PathBuf> {
    sibling(original, MANIFEST_SUFFIX)
}

pub fn temp_path(original: &Path) -> Result<PathBuf> {
    sibling(original, TEMP_SUFFIX)
}

pub fn backup_path(original: &Path) -> Result<PathBuf> {
    sibling(original, BACKUP_SUFFIX)
}

/// All part paths for a file split into `parts` pieces
pub fn part_paths(original: &Path, parts: u64) -> Result<Vec<PathBuf>> {
    if parts > MAX_PARTS {
        return Err(SplitStitchError::TooManyParts {
            parts,
            max: MAX_PARTS,
        });
    }
    (0..parts).map(|i| part_path(original, i)).collect()
}

/// Append `suffix` to the file name of `original`
fn sibling(original: &Path, suffix: &str) -> Result<PathBuf> {
    let name = original
        .file_name()
        .ok_or_else(|| SplitStitchError::InvalidPath(original.to_path_buf()))?;

    let mut new_name = OsString::from(name);
    new_name.push(suffix);

    let path = original.with_file_name(&new_name);
    if new_name.as_encoded_bytes().len() > MAX_FILE_NAME_LEN {
        return Err(SplitStitchError::PathTooLong(path));
    }
    Ok(path)
}
