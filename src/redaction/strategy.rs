//! Sanitize strategy trait and supporting types.
//!
//! A strategy owns one document format: it opens the input, hands its
//! containers to the matching engine and writes the result.

use crate::domain::ReplacementSet;
use crate::error::{SanitizerError, SanitizerResult};
use crate::page::ScrubReport;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Document formats with a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// WordprocessingML package (flowing text)
    Docx,

    /// PDF (fixed-layout pages)
    Pdf,
}

impl DocumentFormat {
    /// Detects the format from the file extension.
    pub fn from_path(path: &Path) -> SanitizerResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(SanitizerError::UnsupportedFormat { extension }),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docx => f.write_str("DOCX"),
            Self::Pdf => f.write_str("PDF"),
        }
    }
}

/// Statistics about a sanitize operation.
///
/// For PDFs a container is a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeStats {
    pub containers_processed: usize,
    pub containers_changed: usize,
    pub replacements_applied: usize,

    /// Entries in the final replacement set
    pub entries_total: usize,

    /// Distinct entries that matched at least once
    pub entries_consumed: usize,

    pub degraded_rewrites: usize,
    pub iteration_limit_hits: usize,
    pub links_unwrapped: usize,
    pub images_replaced: usize,
    pub rects_skipped: usize,
    pub safety_net_added: usize,
    pub scrub: ScrubReport,
}

impl SanitizeStats {
    /// Creates stats indicating nothing was changed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any replacement was written.
    pub fn has_replacements(&self) -> bool {
        self.replacements_applied > 0
    }
}

/// Strategy for sanitizing one document format.
pub trait SanitizeStrategy: Send + Sync {
    /// Applies `set` to `input` and writes the result to `output`.
    fn sanitize(&self, input: &Path, output: &Path, set: &ReplacementSet) -> SanitizerResult<SanitizeStats>;

    /// Flattened document text, as scanned by the safety net.
    fn extract_text(&self, input: &Path) -> SanitizerResult<String>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;

    fn format(&self) -> DocumentFormat;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let stats = SanitizeStats::none();
        assert!(!stats.has_replacements());

        let stats = SanitizeStats {
            replacements_applied: 5,
            ..Default::default()
        };
        assert!(stats.has_replacements());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.DOCX")).unwrap(), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_path(Path::new("x.pdf")).unwrap(), DocumentFormat::Pdf);

        let err = DocumentFormat::from_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, SanitizerError::UnsupportedFormat { ref extension } if extension == "txt"));
        assert!(DocumentFormat::from_path(Path::new("README")).is_err());
    }
}
