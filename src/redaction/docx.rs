//! DOCX strategy: flow engine over every paragraph, optional picture
//! placeholders.

use super::strategy::{DocumentFormat, SanitizeStats, SanitizeStrategy};
use crate::backend::DocxDocument;
use crate::config::EngineConfig;
use crate::domain::ReplacementSet;
use crate::error::SanitizerResult;
use crate::flow::FlowEngine;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct DocxStrategy {
    config: EngineConfig,
}

impl DocxStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl SanitizeStrategy for DocxStrategy {
    fn sanitize(&self, input: &Path, output: &Path, set: &ReplacementSet) -> SanitizerResult<SanitizeStats> {
        let engine = FlowEngine::new(set, &self.config)?;
        let mut doc = DocxDocument::open(input)?;

        let images_replaced = if self.config.image_placeholders {
            doc.replace_images()
        } else {
            0
        };
        let outcome = doc.sanitize(&engine);
        doc.save(output)?;

        let stats = SanitizeStats {
            containers_processed: outcome.containers_processed,
            containers_changed: outcome.containers_changed,
            replacements_applied: outcome.replacements,
            entries_total: set.len(),
            entries_consumed: outcome.consumed.len(),
            degraded_rewrites: outcome.degraded_rewrites,
            iteration_limit_hits: outcome.limit_hits,
            links_unwrapped: outcome.links_unwrapped,
            images_replaced,
            ..Default::default()
        };
        tracing::info!(
            paragraphs = stats.containers_processed,
            changed = stats.containers_changed,
            replacements = stats.replacements_applied,
            "sanitized DOCX"
        );
        Ok(stats)
    }

    fn extract_text(&self, input: &Path) -> SanitizerResult<String> {
        Ok(DocxDocument::open(input)?.text())
    }

    fn name(&self) -> &str {
        "DOCX (flow splice)"
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }
}
