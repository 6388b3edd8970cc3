use crate::error::Result;
use crate::layout;
use crate::manifest::{read_manifest, Manifest};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk state of one artifact next to the original
#[derive(Debug, Clone, Serialize)]
pub struct FileState {
    pub path: PathBuf,
    /// None when the file is absent
    pub size: Option<u64>,
}

impl FileState {
    fn probe(path: PathBuf) -> Self {
        let size = fs::metadata(&path).ok().map(|m| m.len());
        Self { path, size }
    }

    pub fn exists(&self) -> bool {
        self.size.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoReport {
    pub manifest: Manifest,
    pub original: FileState,
    pub temp: FileState,
    pub backup: FileState,
    pub parts: Vec<FileState>,
}

impl InfoReport {
    pub fn parts_present(&self) -> usize {
        self.parts.iter().filter(|p| p.exists()).count()
    }

    pub fn parts_bytes(&self) -> u64 {
        self.parts.iter().filter_map(|p| p.size).sum()
    }

    /// A `.tmp` file only survives a stitch that was killed mid-way
    pub fn interrupted(&self) -> bool {
        self.temp.exists()
    }
}

/// Inspect a manifest and the files around it
pub fn collect_info(manifest_path: &Path) -> Result<InfoReport> {
    let manifest = read_manifest(manifest_path)?;
    let original = manifest.original_path();

    let parts = manifest
        .part_paths()?
        .into_iter()
        .map(FileState::probe)
        .collect();

    Ok(InfoReport {
        original: FileState::probe(original.clone()),
        temp: FileState::probe(layout::temp_path(&original)?),
        backup: FileState::probe(layout::backup_path(&original)?),
        parts,
        manifest,
    })
}

/// Display information about a manifest and its parts
pub fn show_info(manifest_path: &Path) -> Result<String> {
    let report = collect_info(manifest_path)?;
    let manifest = &report.manifest;

    let mut output = String::new();

    output.push_str("Split Manifest Information\n");
    output.push_str("==========================\n\n");

    output.push_str(&format!("Manifest: {}\n", manifest_path.display()));
    output.push_str(&format!("Original file: {}\n", manifest.original_file));
    output.push_str(&format!(
        "Total size: {} ({} bytes)\n",
        format_size(manifest.total_size),
        manifest.total_size
    ));
    output.push_str(&format!("Parts: {}\n", manifest.parts));
    output.push_str(&format!("SHA-256: {}\n", manifest.sha256));
    output.push('\n');

    output.push_str("Parts on disk:\n");
    for part in &report.parts {
        match part.size {
            Some(size) => output.push_str(&format!(
                "  {}  {}\n",
                part.path.display(),
                format_size(size)
            )),
            None => output.push_str(&format!("  {}  MISSING\n", part.path.display())),
        }
    }
    output.push_str(&format!(
        "  Present: {} / {}\n",
        report.parts_present(),
        manifest.parts
    ));
    output.push_str(&format!(
        "  Bytes present: {} / {}\n",
        report.parts_bytes(),
        manifest.total_size
    ));
    output.push('\n');

    output.push_str("Related files:\n");
    for (label, state) in [
        ("Original", &report.original),
        ("Temp", &report.temp),
        ("Backup", &report.backup),
    ] {
        let status = match state.size {
            Some(size) => format_size(size),
            None => "absent".to_string(),
        };
        output.push_str(&format!("  {}: {} ({})\n", label, state.path.display(), status));
    }

    if report.interrupted() {
        output.push('\n');
        output.push_str("Warning: a temp file is present, a stitch may have been interrupted.\n");
        if !report.original.exists() && report.backup.exists() {
            output.push_str(
                "  The original is missing. Restore it from the backup, or re-run stitch.\n",
            );
        } else {
            output.push_str("  Remove the temp file and re-run stitch.\n");
        }
    }

    Ok(output)
}

pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
