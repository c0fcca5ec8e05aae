//! Utility functions and helpers for the upload path

use anyhow::{Context, Result};
use std::path::Path;

/// Ensure a directory exists, creating it if necessary
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

/// Lowercased extension of a client supplied filename, if it has one.
///
/// Only the final component is considered, so `../../x.png` yields `png`.
pub(crate) fn file_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

/// Validate that a file has an allowed extension
pub(crate) fn validate_file_extension<S: AsRef<str>>(filename: &str, allowed_extensions: &[S]) -> bool {
    match file_extension(filename) {
        Some(ext) => allowed_extensions
            .iter()
            .any(|e| e.as_ref().eq_ignore_ascii_case(&ext)),
        None => false,
    }
}
