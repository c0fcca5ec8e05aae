//! Transient storage for uploaded images.
//!
//! Uploads are written under random names inside the upload directory and
//! removed when the guard is dropped, whatever path the request takes.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::error::{AppError, Result, ResultExt};
use crate::utils::{ensure_dir_exists, file_extension, validate_file_extension};

/// An uploaded file on disk, deleted on drop.
#[derive(Debug)]
pub(crate) struct TransientUpload {
    file: NamedTempFile,
}

impl TransientUpload {
    /// Write `data` to a fresh file in `dir`.
    pub(crate) async fn persist(dir: &Path, suffix: String, data: Bytes) -> Result<Self> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || Self::persist_blocking(&dir, &suffix, &data)).await?
    }

    fn persist_blocking(dir: &Path, suffix: &str, data: &[u8]) -> Result<Self> {
        ensure_dir_exists(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(suffix)
            .tempfile_in(dir)
            .with_context(|| format!("creating upload file in {}", dir.display()))?;
        file.write_all(data).context("writing upload")?;
        file.flush().context("flushing upload")?;

        log::debug!("Stored {} byte upload at {}", data.len(), file.path().display());
        Ok(Self { file })
    }

    /// Location of the stored upload.
    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, logging rather than failing if that goes wrong.
    pub(crate) fn remove(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            log::warn!("Failed to remove upload {}: {}", path.display(), e);
        }
    }
}

/// Pick the on-disk suffix for an upload.
///
/// The client filename is only trusted for its extension, which must be on
/// the allow list. Without one, the declared content type is consulted; if
/// that is unknown too the file gets no suffix and decoding sniffs the format.
pub(crate) fn upload_suffix<S: AsRef<str>>(
    file_name: Option<&str>,
    content_type: Option<&str>,
    allowed_extensions: &[S],
) -> Result<String> {
    if let Some(name) = file_name {
        if let Some(ext) = file_extension(name) {
            if !validate_file_extension(name, allowed_extensions) {
                return Err(AppError::InvalidInput(format!(
                    "Unsupported file type: .{}",
                    ext
                )));
            }
            return Ok(format!(".{}", ext));
        }
    }

    let from_mime = content_type
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|exts| {
            exts.iter().find(|ext| {
                allowed_extensions
                    .iter()
                    .any(|a| a.as_ref().eq_ignore_ascii_case(ext))
            })
        });

    Ok(from_mime.map(|ext| format!(".{}", ext)).unwrap_or_default())
}
