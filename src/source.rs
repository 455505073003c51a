use std::path::Path;

use crate::error::ExtractError;

/// Something that turns an input file into raw text.
pub trait TextSource: Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// PDF question banks, via `pdf-extract`.
pub struct PdfText;

impl TextSource for PdfText {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let text = pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if text.trim().is_empty() {
            tracing::warn!(path = %path.display(), "pdf produced no text");
        }
        Ok(text)
    }
}

/// Text that was already extracted by another tool.
pub struct PlainText;

impl TextSource for PlainText {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
