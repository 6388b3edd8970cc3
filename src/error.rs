use std::path::PathBuf;
use thiserror::Error;

/// Broad failure classes reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open, read, write, stat, or rename failed
    Io,
    /// Manifest, path, or option is malformed; nothing was touched
    Format,
    /// Reassembled data does not match the manifest
    Integrity,
}

#[derive(Error, Debug)]
pub enum SplitStitchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read part {}: {source}", .path.display())]
    PartUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup of {} failed: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Commit to {} failed: {source} (previous content restored: {restored})",
        .path.display()
    )]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        restored: bool,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Path cannot be recorded in a manifest: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Path too long: {}", .0.display())]
    PathTooLong(PathBuf),

    #[error("Invalid part size: {0}. Must be a positive number of megabytes")]
    InvalidPartSize(u64),

    #[error("Too many parts: {parts} needed, maximum is {max}. Use a larger part size")]
    TooManyParts { parts: u64, max: u64 },

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

impl SplitStitchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_)
            | Self::Json(_)
            | Self::PartUnreadable { .. }
            | Self::Backup { .. }
            | Self::Commit { .. } => ErrorKind::Io,
            Self::InvalidManifest(_)
            | Self::InvalidPath(_)
            | Self::PathTooLong(_)
            | Self::InvalidPartSize(_)
            | Self::TooManyParts { .. } => ErrorKind::Format,
            Self::DigestMismatch { .. } | Self::SizeMismatch { .. } => ErrorKind::Integrity,
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitStitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let io = SplitStitchError::Io(std::io::Error::other("boom"));
        assert_eq!(io.kind(), ErrorKind::Io);

        let format = SplitStitchError::InvalidManifest("missing parts".into());
        assert_eq!(format.kind(), ErrorKind::Format);

        let integrity = SplitStitchError::SizeMismatch { expected: 1, actual: 2 };
        assert_eq!(integrity.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_commit_message_mentions_rollback() {
        let err = SplitStitchError::Commit {
            path: PathBuf::from("data.bin"),
            source: std::io::Error::other("denied"),
            restored: true,
        };
        let msg = err.to_string();
        assert!(msg.contains("data.bin"));
        assert!(msg.contains("restored"));
    }
}
