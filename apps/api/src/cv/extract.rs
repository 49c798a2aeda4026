//! Text extraction for uploaded CVs.
//!
//! PDF parsing is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const TEXT_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvFormat {
    Pdf,
    PlainText,
}

impl CvFormat {
    /// Detects the format from the declared content type, falling back to the
    /// file extension when the client sent a generic type.
    pub fn detect(content_type: &str, file_name: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        let file_name = file_name.trim().to_ascii_lowercase();

        if content_type == PDF_CONTENT_TYPE || file_name.ends_with(".pdf") {
            Some(CvFormat::Pdf)
        } else if content_type.starts_with(TEXT_CONTENT_TYPE) || file_name.ends_with(".txt") {
            Some(CvFormat::PlainText)
        } else {
            None
        }
    }
}

/// Extracts normalised text from an uploaded CV.
///
/// `Ok(None)` means the file parsed but holds no text (a scanned PDF, say).
/// Such a CV can be stored but cannot seed an interview.
pub async fn extract_text(format: CvFormat, data: Bytes) -> Result<Option<String>, AppError> {
    let raw = match format {
        CvFormat::PlainText => String::from_utf8_lossy(&data).into_owned(),
        CvFormat::Pdf => {
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "spawn_blocking failed in PDF extraction: {e}"
                    ))
                })?
                .map_err(|e| {
                    warn!("PDF text extraction failed: {e}");
                    AppError::Validation("The uploaded PDF could not be read.".to_string())
                })?
        }
    };

    let text = normalize_text(&raw);
    Ok((!text.is_empty()).then_some(text))
}

/// Trims every line and collapses runs of blank lines to one.
pub fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
