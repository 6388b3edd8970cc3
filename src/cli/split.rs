use crate::digest::{FileDigest, StreamHasher};
use crate::error::{Result, SplitStitchError};
use crate::layout::{self, MAX_PARTS};
use crate::manifest::{write_manifest, Manifest};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One megabyte as the CLI counts it
pub const MEGABYTE: u64 = 1024 * 1024;

/// Stays under the 50 MB per-file limit common to git hosting and chat uploads
pub const DEFAULT_PART_SIZE_MB: u64 = 45;

/// Options for the split command
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Part size in bytes
    pub part_size: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE_MB * MEGABYTE,
        }
    }
}

impl SplitOptions {
    pub fn from_megabytes(megabytes: u64) -> Result<Self> {
        if megabytes == 0 {
            return Err(SplitStitchError::InvalidPartSize(megabytes));
        }
        let part_size = megabytes
            .checked_mul(MEGABYTE)
            .ok_or(SplitStitchError::InvalidPartSize(megabytes))?;
        Ok(Self { part_size })
    }
}

/// What a split produced
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub part_paths: Vec<PathBuf>,
    pub part_sizes: Vec<u64>,
}

/// Byte length of each part for a file of `total_size` bytes.
///
/// A zero-length file still gets one (empty) part so every manifest
/// has `parts >= 1`.
pub fn plan_parts(total_size: u64, part_size: u64) -> Result<Vec<u64>> {
    if part_size == 0 {
        return Err(SplitStitchError::InvalidPartSize(0));
    }

    let count = total_size.div_ceil(part_size).max(1);
    if count > MAX_PARTS {
        return Err(SplitStitchError::TooManyParts {
            parts: count,
            max: MAX_PARTS,
        });
    }

    let mut sizes = Vec::with_capacity(count as usize);
    let mut remaining = total_size;
    for _ in 0..count {
        let size = remaining.min(part_size);
        sizes.push(size);
        remaining -= size;
    }
    Ok(sizes)
}

/// Split `input_path` into `<input>.partNNNN` files plus `<input>.manifest`.
///
/// The source is never modified. If writing fails part-way, parts already
/// written stay on disk; re-running the split overwrites them.
pub fn split_file(input_path: &Path, options: &SplitOptions) -> Result<SplitReport> {
    let total_size = std::fs::metadata(input_path)?.len();
    let part_sizes = plan_parts(total_size, options.part_size)?;

    // Every derived name is checked before the first byte is written
    let part_paths = layout::part_paths(input_path, part_sizes.len() as u64)?;
    let manifest_path = layout::manifest_path(input_path)?;
    crate::manifest::manifest_safe_path(input_path)?;

    info!(
        stage = "hash",
        file = %input_path.display(),
        total_size,
        parts = part_sizes.len(),
        "hashing source"
    );
    let sha256 = hash_source(input_path, total_size)?;

    info!(stage = "write_parts", parts = part_sizes.len(), "writing parts");
    let mut reader = BufReader::new(File::open(input_path)?);
    for (path, &size) in part_paths.iter().zip(&part_sizes) {
        write_part(&mut reader, path, size)?;
        debug!(part = %path.display(), bytes = size, "wrote part");
    }

    let manifest = Manifest::new(input_path, total_size, part_sizes.len() as u64, sha256)?;
    info!(stage = "write_manifest", manifest = %manifest_path.display(), "writing manifest");
    write_manifest(&manifest_path, &manifest)?;

    Ok(SplitReport {
        manifest_path,
        manifest,
        part_paths,
        part_sizes,
    })
}

/// Digest of the source, which must still be `total_size` bytes long
fn hash_source(path: &Path, total_size: u64) -> Result<FileDigest> {
    let mut hasher = StreamHasher::new();
    hasher.update_reader(&mut File::open(path)?)?;
    if hasher.bytes_hashed() != total_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} changed size during split ({} bytes expected, {} hashed)",
                path.display(),
                total_size,
                hasher.bytes_hashed()
            ),
        )
        .into());
    }
    Ok(hasher.finalize())
}

fn write_part<R: Read>(reader: &mut R, path: &Path, size: u64) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let copied = io::copy(&mut reader.take(size), &mut writer)?;
    if copied != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "source ended early while writing {} ({} of {} bytes)",
                path.display(),
                copied,
                size
            ),
        )
        .into());
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
