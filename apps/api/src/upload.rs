//! PDF upload text extraction.
//!
//! The upload is written to a named temp file, parsed with `pdf-extract` on
//! the blocking pool, and the file is removed afterwards with bounded retries.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Multipart field names that may carry the PDF.
pub const ACCEPTED_FIELDS: [&str; 4] = ["file", "pdf", "document", "resume"];
pub const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["application/pdf", "application/x-pdf"];

const REMOVE_ATTEMPTS: u32 = 3;
const REMOVE_BASE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not stage upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("PDF contains no extractable text")]
    Empty,

    #[error("extraction task failed: {0}")]
    Task(String),
}

pub fn is_accepted_field(name: &str) -> bool {
    ACCEPTED_FIELDS.contains(&name)
}

/// Accepts `application/pdf` and `application/x-pdf`, ignoring parameters.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_CONTENT_TYPES.contains(&essence.as_str())
}

/// Extracts plain text from PDF bytes.
pub async fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let path = stage(bytes)?;
    debug!("Staged upload at {}", path.display());

    let blocking_path = path.clone();
    let result =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&blocking_path)).await;

    remove_with_retries(&path).await;

    let text = result
        .map_err(|e| ExtractError::Task(e.to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}

fn stage(bytes: &[u8]) -> Result<PathBuf, ExtractError> {
    let mut file = tempfile::Builder::new()
        .prefix("resume-upload-")
        .suffix(".pdf")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

/// Deletes `path`, retrying with a linearly growing delay. Returns whether
/// the file is gone. A missing file counts as removed.
pub async fn remove_with_retries(path: &Path) -> bool {
    for attempt in 0..REMOVE_ATTEMPTS {
        match tokio::fs::remove_file(path).await {
            Ok(()) => return true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return true,
            Err(e) if attempt + 1 < REMOVE_ATTEMPTS => {
                debug!(
                    "Removing {} failed (attempt {}): {e}",
                    path.display(),
                    attempt + 1
                );
                tokio::time::sleep(REMOVE_BASE_DELAY * (attempt + 1)).await;
            }
            Err(e) => {
                warn!(
                    "Could not remove temp file {} after {REMOVE_ATTEMPTS} attempts: {e}",
                    path.display()
                );
            }
        }
    }
    false
}

/// First 500 characters of the extracted text, with "..." when truncated.
pub fn preview(text: &str) -> String {
    const LIMIT: usize = 500;
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
