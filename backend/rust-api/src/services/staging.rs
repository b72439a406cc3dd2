//! Temporary on-disk copies of uploaded files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::services::content_classifier::{extension_of, mime_type};

/// An uploaded file written to a uniquely named temp file.
///
/// The file is removed when the value is dropped, whichever way the
/// request ends.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    filename: String,
    mime_type: &'static str,
    size: u64,
}

impl StagedUpload {
    pub async fn stage(dir: &Path, filename: &str, bytes: &[u8]) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create upload dir {}", dir.display()))?;

        let suffix = extension_of(filename);
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .context("Failed to create temp file for upload")?;

        tokio::fs::write(file.path(), bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", filename))?;

        tracing::debug!(
            "Staged upload {} ({} bytes) at {}",
            filename,
            bytes.len(),
            file.path().display()
        );

        Ok(Self {
            file,
            filename: filename.to_string(),
            mime_type: mime_type(filename),
            size: bytes.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        tracing::debug!("Releasing staged upload {}", self.file.path().display());
    }
}

/// Default staging directory under the system temp dir.
pub fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("neuralsync-uploads")
}
