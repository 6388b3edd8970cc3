use crate::digest::FileDigest;
use crate::error::{Result, SplitStitchError};
use crate::layout::{self, MAX_PARTS};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::Lines;

const KEY_ORIGINAL_FILE: &str = "original_file";
const KEY_TOTAL_SIZE: &str = "total_size";
const KEY_PARTS: &str = "parts";
const KEY_SHA256: &str = "sha256";

/// Split metadata binding a set of parts to the file they rebuild
///
/// On disk this is exactly four `key=value` lines in this order:
///
/// ```text
/// original_file=data.bin
/// total_size=104857600
/// parts=3
/// sha256=<64 hex characters>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Path of the original file, as given to `split`
    pub original_file: String,
    /// Original size in bytes
    pub total_size: u64,
    /// Number of part files
    pub parts: u64,
    /// Digest of the whole original file
    pub sha256: FileDigest,
}

impl Manifest {
    pub fn new(original: &Path, total_size: u64, parts: u64, sha256: FileDigest) -> Result<Self> {
        let original_file = manifest_safe_path(original)?;
        Ok(Self {
            original_file,
            total_size,
            parts,
            sha256,
        })
    }

    pub fn original_path(&self) -> PathBuf {
        PathBuf::from(&self.original_file)
    }

    pub fn part_paths(&self) -> Result<Vec<PathBuf>> {
        layout::part_paths(&self.original_path(), self.parts)
    }
}

/// The original path goes into a line-oriented text file, so it must be
/// UTF-8 without line breaks
pub fn manifest_safe_path(path: &Path) -> Result<String> {
    match path.to_str() {
        Some(s) if !s.is_empty() && !s.contains(['\n', '\r']) => Ok(s.to_string()),
        _ => Err(SplitStitchError::InvalidPath(path.to_path_buf())),
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}={}", KEY_ORIGINAL_FILE, self.original_file)?;
        writeln!(f, "{}={}", KEY_TOTAL_SIZE, self.total_size)?;
        writeln!(f, "{}={}", KEY_PARTS, self.parts)?;
        writeln!(f, "{}={}", KEY_SHA256, self.sha256)
    }
}

impl std::str::FromStr for Manifest {
    type Err = SplitStitchError;

    fn from_str(s: &str) -> Result<Self> {
        // Trailing blank lines are tolerated, nothing else out of place is
        let mut lines = s.trim_end_matches(['\r', '\n']).lines();

        let original_file = next_field(&mut lines, 1, KEY_ORIGINAL_FILE)?;
        if original_file.is_empty() {
            return Err(invalid("original_file is empty"));
        }
        let total_size = parse_u64(KEY_TOTAL_SIZE, next_field(&mut lines, 2, KEY_TOTAL_SIZE)?)?;
        let parts = parse_u64(KEY_PARTS, next_field(&mut lines, 3, KEY_PARTS)?)?;
        let sha256 = next_field(&mut lines, 4, KEY_SHA256)?.parse::<FileDigest>()?;

        if let Some(extra) = lines.next() {
            return Err(invalid(format!("unexpected line after sha256: {:?}", extra)));
        }

        if parts == 0 || parts > MAX_PARTS {
            return Err(invalid(format!(
                "parts must be between 1 and {}, got {}",
                MAX_PARTS, parts
            )));
        }

        Ok(Self {
            original_file: original_file.to_string(),
            total_size,
            parts,
            sha256,
        })
    }
}

/// Value of the next line, which must be `key=...`
fn next_field<'a>(lines: &mut Lines<'a>, lineno: usize, key: &str) -> Result<&'a str> {
    let line = lines.next().ok_or_else(|| missing(key))?;
    match line.split_once('=') {
        Some((found, value)) if found == key => Ok(value),
        _ => Err(invalid(format!(
            "line {} must be {}=<value>, got {:?}",
            lineno, key, line
        ))),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    // u64::from_str accepts a leading '+', the format does not
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("{} is not a non-negative integer: {:?}", key, value)));
    }
    value
        .parse()
        .map_err(|_| invalid(format!("{} is out of range: {}", key, value)))
}

fn invalid(msg: impl Into<String>) -> SplitStitchError {
    SplitStitchError::InvalidManifest(msg.into())
}

fn missing(key: &str) -> SplitStitchError {
    invalid(format!("missing field {}", key))
}

/// Write a manifest file
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write!(writer, "{}", manifest)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Read and validate a manifest file
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path)?;
    text.parse()
}
