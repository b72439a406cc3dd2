use std::path::Path;

use thiserror::Error;

use crate::models::content::ContentKind;

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".webm"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".txt", ".doc", ".docx"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported file type: {extension}")]
pub struct UnsupportedExtension {
    pub extension: String,
}

/// Lowercased extension including the leading dot, empty when there is none.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Maps a filename to its content kind by extension alone.
pub fn classify(filename: &str) -> Result<ContentKind, UnsupportedExtension> {
    let extension = extension_of(filename);
    let ext = extension.as_str();

    if VIDEO_EXTENSIONS.contains(&ext) {
        Ok(ContentKind::Video)
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Ok(ContentKind::Image)
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        Ok(ContentKind::Document)
    } else {
        Err(UnsupportedExtension { extension })
    }
}

/// MIME type sent upstream along with the file bytes.
pub fn mime_type(filename: &str) -> &'static str {
    match extension_of(filename).as_str() {
        ".mp4" => "video/mp4",
        ".avi" => "video/x-msvideo",
        ".mov" => "video/quicktime",
        ".webm" => "video/webm",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".pdf" => "application/pdf",
        ".txt" => "text/plain",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
