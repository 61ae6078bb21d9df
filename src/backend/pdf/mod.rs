//! PDF backend: MuPDF pages plus a lopdf finishing pass.

pub mod ffi;
pub mod finish;
pub mod mupdf;

pub use self::mupdf::{MupdfDocument, MupdfPage};

use crate::error::{SanitizerError, SanitizerResult};
use std::path::Path;

/// Extracts the text of a PDF with `pdf-extract`.
pub fn extract_text(input: &Path) -> SanitizerResult<String> {
    let bytes = std::fs::read(input).map_err(|e| SanitizerError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| SanitizerError::TextExtraction {
        path: input.to_path_buf(),
        reason: e.to_string(),
    })
}
