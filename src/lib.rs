//! Splitstitch - fixed-size file splitting with verified reassembly
//!
//! Large files are cut into numbered parts small enough for size-limited
//! transports, alongside a manifest recording the original size and SHA-256
//! digest. Stitching concatenates the parts into a scratch file and only
//! replaces the original after the digest matches.
//!
//! ## Files
//!
//! ```text
//! data.bin.part0000 .. data.bin.partNNNN   parts, 4-digit index
//! data.bin.manifest                         original_file / total_size / parts / sha256
//! data.bin.tmp                              scratch file during stitch
//! data.bin.bkp                              previous data.bin, kept after stitch
//! ```
//!
//! ## Stitch stages
//!
//! ```text
//! parse_manifest → reassemble → verify → backup → commit → cleanup
//! ```
//!
//! Any failure before `commit` leaves the original and all parts untouched
//! and removes the scratch file.
//!
//! ## Example
//!
//! ```no_run
//! use splitstitch::cli::{split_file, stitch_file, SplitOptions, StitchOptions};
//! use std::path::Path;
//!
//! let split = split_file(Path::new("disk.img"), &SplitOptions::default()).unwrap();
//! println!("{} parts", split.manifest.parts);
//!
//! stitch_file(&split.manifest_path, &StitchOptions::default()).unwrap();
//! ```

pub mod cli;
pub mod digest;
pub mod error;
pub mod integrity;
pub mod layout;
pub mod manifest;

pub use digest::{hash_file, FileDigest};
pub use error::{ErrorKind, Result, SplitStitchError};
pub use manifest::{read_manifest, write_manifest, Manifest};
