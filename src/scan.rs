//! Source directory scanning.
//!
//! Stage 1 of the pipeline. Lists the stereo pairs to process:
//!
//! ```text
//! originals/
//! ├── stereo.toml        # Batch config (not an input)
//! ├── harbour.jpg        # ✓
//! ├── sample.JPEG        # ✓ extension match is case-insensitive
//! ├── .DS_Store          # hidden, skipped
//! ├── notes.txt          # not a JPEG, skipped
//! └── rejects/           # subdirectories are not descended into
//!     └── blurry.jpg
//! ```
//!
//! Inputs are returned in filename order so runs are reproducible regardless
//! of directory iteration order.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source directory not found: {0}")]
    NotFound(PathBuf),
}

/// One input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPhoto {
    pub path: PathBuf,
    /// File name with extension, used as the config lookup key.
    pub filename: String,
}

const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// List the JPEG inputs directly inside `source`, sorted by filename.
pub fn scan(source: &Path) -> Result<Vec<InputPhoto>, ScanError> {
    if !source.is_dir() {
        return Err(ScanError::NotFound(source.to_path_buf()));
    }

    let mut inputs: Vec<InputPhoto> = fs::read_dir(source)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_input(p))
        .filter_map(|path| {
            let filename = path.file_name()?.to_str()?.to_string();
            Some(InputPhoto { path, filename })
        })
        .collect();

    inputs.sort_by(|a, b| a.filename.cmp(&b.filename));
    tracing::debug!(count = inputs.len(), source = %source.display(), "scanned inputs");
    Ok(inputs)
}

fn is_input(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let hidden = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    !hidden && INPUT_EXTENSIONS.contains(&ext.as_str())
}
