//! Error types for the sanitizer library.
//!
//! Structural failures (a document that cannot be opened or enumerated) are
//! surfaced through [`SanitizerError`]. Everything that can be recovered
//! locally (an unmatched entry, a rectangle that fails to redact) is logged
//! and counted in the statistics instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sanitizer operations.
pub type SanitizerResult<T> = Result<T, SanitizerError>;

/// Boxed source error carried by backend variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all sanitize operations.
#[derive(Debug, Error)]
pub enum SanitizerError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document could not be opened or its containers enumerated
    #[error("Malformed {format} document: {reason}")]
    MalformedDocument { format: String, reason: String },

    /// Error occurred during PDF processing
    #[error("PDF processing error{}: {message}", page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Pattern compilation error
    #[error("Pattern error for '{pattern}': {reason}")]
    PatternError { pattern: String, reason: String },

    /// Text extraction failed
    #[error("Text extraction failed for '{}': {reason}", path.display())]
    TextExtraction { path: PathBuf, reason: String },

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// File extension not handled by any strategy
    #[error("Unsupported file type '{extension}' (supported: .docx, .pdf)")]
    UnsupportedFormat { extension: String },

    /// Backend-specific error (MuPDF, lopdf, zip, XML)
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl SanitizerError {
    /// Convenience constructor for [`SanitizerError::MalformedDocument`].
    pub fn malformed(format: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            format: format.to_string(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`SanitizerError::BackendError`] without a source.
    pub fn backend(backend: &str, message: impl Into<String>) -> Self {
        Self::BackendError {
            backend: backend.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if the error means the input document itself is unusable.
    pub fn is_fatal_document_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedDocument { .. } | Self::UnsupportedFormat { .. } | Self::Io { .. }
        )
    }
}

impl From<io::Error> for SanitizerError {
    fn from(err: io::Error) -> Self {
        Self::BackendError {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<regex::Error> for SanitizerError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for SanitizerError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::BackendError {
            backend: "zip".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<quick_xml::Error> for SanitizerError {
    fn from(err: quick_xml::Error) -> Self {
        Self::BackendError {
            backend: "quick-xml".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<lopdf::Error> for SanitizerError {
    fn from(err: lopdf::Error) -> Self {
        Self::BackendError {
            backend: "lopdf".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for SanitizerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput {
            parameter: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for SanitizerError {
    fn from(err: anyhow::Error) -> Self {
        Self::BackendError {
            backend: "anyhow".to_string(),
            message: err.to_string(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SanitizerError::malformed("DOCX", "missing word/document.xml");
        assert_eq!(
            err.to_string(),
            "Malformed DOCX document: missing word/document.xml"
        );
    }

    #[test]
    fn test_pdf_error_page_suffix() {
        let err = SanitizerError::PdfProcessing {
            message: "load failed".to_string(),
            page: Some(3),
            source: None,
        };
        assert_eq!(err.to_string(), "PDF processing error on page 3: load failed");

        let err = SanitizerError::PdfProcessing {
            message: "open failed".to_string(),
            page: None,
            source: None,
        };
        assert_eq!(err.to_string(), "PDF processing error: open failed");
    }
}
