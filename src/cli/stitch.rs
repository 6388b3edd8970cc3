use crate::digest::{hash_file, FileDigest, BUF_SIZE};
use crate::error::{Result, SplitStitchError};
use crate::integrity::{verify_digest, verify_size};
use crate::layout;
use crate::manifest::{read_manifest, Manifest};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Stages of a stitch, in order. A failure before `Cleanup` leaves the
/// parts and the original exactly as they were (see `Commit` for the one
/// exception).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseManifest,
    Reassemble,
    Verify,
    Backup,
    Commit,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParseManifest => "parse_manifest",
            Stage::Reassemble => "reassemble",
            Stage::Verify => "verify",
            Stage::Backup => "backup",
            Stage::Commit => "commit",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Options for the stitch command
#[derive(Debug, Clone, Default)]
pub struct StitchOptions {
    /// Leave part files in place after a successful commit
    pub keep_parts: bool,
}

/// What a successful stitch did
#[derive(Debug, Clone, Serialize)]
pub struct StitchReport {
    pub original: PathBuf,
    pub total_size: u64,
    pub sha256: FileDigest,
    /// Where the previous content went, if there was any
    pub backup: Option<PathBuf>,
    pub removed_parts: Vec<PathBuf>,
    /// Parts that could not be deleted; harmless leftovers
    pub orphaned_parts: Vec<PathBuf>,
}

/// Rebuild the original file from its manifest and parts.
///
/// Parts are concatenated into `<original>.tmp`, which is checked against the
/// manifest's size and digest. Only then is any existing `<original>` moved to
/// `<original>.bkp` and the temp file renamed into place. Parts are deleted
/// last, and a failure to delete them is not an error.
pub fn stitch_file(manifest_path: &Path, options: &StitchOptions) -> Result<StitchReport> {
    info!(stage = %Stage::ParseManifest, manifest = %manifest_path.display(), "reading manifest");
    let manifest = read_manifest(manifest_path).map_err(|e| log_failure(Stage::ParseManifest, e))?;
    let original = manifest.original_path();
    let part_paths = manifest.part_paths()?;
    let temp = layout::temp_path(&original)?;
    let backup = layout::backup_path(&original)?;

    info!(stage = %Stage::Reassemble, parts = manifest.parts, temp = %temp.display(), "reassembling");
    let written = reassemble(&part_paths, &temp).map_err(|e| abort(Stage::Reassemble, &temp, e))?;

    info!(stage = %Stage::Verify, bytes = written, "verifying");
    let sha256 = verify_reconstruction(&manifest, &temp, written)
        .map_err(|e| abort(Stage::Verify, &temp, e))?;

    info!(stage = %Stage::Backup, original = %original.display(), "backing up");
    let backed_up = take_backup(&original, &backup).map_err(|e| abort(Stage::Backup, &temp, e))?;

    info!(stage = %Stage::Commit, original = %original.display(), "committing");
    commit(&temp, &original, backed_up.then_some(backup.as_path()))
        .map_err(|e| abort(Stage::Commit, &temp, e))?;

    let (removed_parts, orphaned_parts) = if options.keep_parts {
        info!(stage = %Stage::Cleanup, "keeping parts");
        (Vec::new(), Vec::new())
    } else {
        info!(stage = %Stage::Cleanup, parts = part_paths.len(), "removing parts");
        remove_parts(part_paths)
    };

    Ok(StitchReport {
        original,
        total_size: manifest.total_size,
        sha256,
        backup: backed_up.then_some(backup),
        removed_parts,
        orphaned_parts,
    })
}

/// Concatenate parts into a fresh temp file, returning the bytes written
fn reassemble(part_paths: &[PathBuf], temp: &Path) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(temp)?);
    let mut buffer = vec![0u8; BUF_SIZE];
    let mut written = 0u64;

    for path in part_paths {
        let copied = copy_part(path, &mut writer, &mut buffer)?;
        debug!(part = %path.display(), bytes = copied, "appended part");
        written += copied;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(written)
}

fn copy_part<W: Write>(path: &Path, writer: &mut W, buffer: &mut [u8]) -> Result<u64> {
    let unreadable = |source| SplitStitchError::PartUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut part = File::open(path).map_err(unreadable)?;
    let mut copied = 0u64;
    loop {
        let n = match part.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(unreadable(e)),
        };
        writer.write_all(&buffer[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}

/// Size first since it is free, then a full re-read of the temp file
fn verify_reconstruction(manifest: &Manifest, temp: &Path, written: u64) -> Result<FileDigest> {
    verify_size(manifest.total_size, written)?;
    let actual = hash_file(temp)?;
    verify_digest(&manifest.sha256, &actual)?;
    Ok(actual)
}

/// Move an existing original out of the way. Returns whether there was one.
fn take_backup(original: &Path, backup: &Path) -> Result<bool> {
    match fs::symlink_metadata(original) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(SplitStitchError::Backup {
                path: original.to_path_buf(),
                source,
            })
        }
    }

    fs::rename(original, backup).map_err(|source| SplitStitchError::Backup {
        path: original.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Rename the verified temp file over the original. If that fails, a backup
/// taken for this stitch is put back.
fn commit(temp: &Path, original: &Path, backup: Option<&Path>) -> Result<()> {
    fs::rename(temp, original).map_err(|source| {
        let restored = backup.is_some_and(|backup| restore_backup(backup, original));
        SplitStitchError::Commit {
            path: original.to_path_buf(),
            source,
            restored,
        }
    })
}

fn restore_backup(backup: &Path, original: &Path) -> bool {
    match fs::rename(backup, original) {
        Ok(()) => {
            warn!(original = %original.display(), "commit failed, previous content restored");
            true
        }
        Err(e) => {
            error!(
                backup = %backup.display(),
                original = %original.display(),
                error = %e,
                "commit failed and backup could not be restored"
            );
            false
        }
    }
}

fn remove_parts(part_paths: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut removed = Vec::with_capacity(part_paths.len());
    let mut orphaned = Vec::new();
    for path in part_paths {
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) => {
                warn!(part = %path.display(), error = %e, "could not remove part");
                orphaned.push(path);
            }
        }
    }
    (removed, orphaned)
}

fn log_failure(stage: Stage, err: SplitStitchError) -> SplitStitchError {
    error!(stage = %stage, kind = ?err.kind(), "{}", err);
    err
}

/// Drop the temp file and pass the error on
fn abort(stage: Stage, temp: &Path, err: SplitStitchError) -> SplitStitchError {
    match fs::remove_file(temp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(temp = %temp.display(), error = %e, "could not remove temp file"),
    }
    log_failure(stage, err)
}
