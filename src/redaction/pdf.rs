//! Secure PDF strategy.
//!
//! Uses MuPDF's redaction API to physically remove the original glyphs,
//! then redraws the replacement text and scrubs the file with lopdf.

use super::strategy::{DocumentFormat, SanitizeStats, SanitizeStrategy};
use crate::backend::{pdf, MupdfDocument};
use crate::config::EngineConfig;
use crate::domain::ReplacementSet;
use crate::error::SanitizerResult;
use crate::page::PageRedactionEngine;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct SecurePdfStrategy {
    config: EngineConfig,
}

impl SecurePdfStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Sets the maximum number of search hits per entry per page.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.config = self.config.with_max_search_hits(max_hits);
        self
    }
}

impl SanitizeStrategy for SecurePdfStrategy {
    fn sanitize(&self, input: &Path, output: &Path, set: &ReplacementSet) -> SanitizerResult<SanitizeStats> {
        let engine = PageRedactionEngine::new(set, &self.config)?;
        let mut doc = MupdfDocument::open(input, output)?;
        let outcome = engine.redact_document(&mut doc)?;

        let stats = SanitizeStats {
            containers_processed: outcome.pages_processed,
            containers_changed: outcome.pages_changed,
            replacements_applied: outcome.replacements,
            entries_total: set.len(),
            entries_consumed: outcome.consumed.len(),
            rects_skipped: outcome.rects_skipped,
            scrub: outcome.scrub,
            ..Default::default()
        };
        tracing::info!(
            pages = stats.containers_processed,
            changed = stats.containers_changed,
            replacements = stats.replacements_applied,
            skipped = stats.rects_skipped,
            "sanitized PDF"
        );
        Ok(stats)
    }

    fn extract_text(&self, input: &Path) -> SanitizerResult<String> {
        pdf::extract_text(input)
    }

    fn name(&self) -> &str {
        "Secure PDF (MuPDF)"
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_creation() {
        let strategy = SecurePdfStrategy::default();
        assert_eq!(strategy.format(), DocumentFormat::Pdf);
        assert_eq!(strategy.config.max_search_hits, 100);
    }

    #[test]
    fn test_max_hits_configuration() {
        let strategy = SecurePdfStrategy::default().with_max_hits(50);
        assert_eq!(strategy.config.max_search_hits, 50);
    }
}
