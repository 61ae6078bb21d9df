//! Per-entry search, cover and redraw across the pages of a document.

use super::{style_at, CoverAndRedraw, PageSurface, PagedDocument, ScrubReport};
use crate::config::EngineConfig;
use crate::domain::{CompiledEntry, ReplacementSet};
use crate::error::SanitizerResult;
use std::collections::BTreeSet;

/// Result of redacting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutcome {
    pub pages_processed: usize,
    pub pages_changed: usize,
    pub replacements: usize,
    pub rects_skipped: usize,
    pub consumed: BTreeSet<usize>,
    pub scrub: ScrubReport,
}

/// Applies a replacement set to fixed-layout pages.
///
/// Covers for an entry are applied as soon as all hits of that entry are
/// registered, so a shorter entry searched later never finds text that a
/// longer entry has already replaced.
#[derive(Debug)]
pub struct PageRedactionEngine<'s> {
    entries: Vec<CompiledEntry<'s>>,
    max_hits: u32,
    fallback_font_size: f32,
}

impl<'s> PageRedactionEngine<'s> {
    pub fn new(set: &'s ReplacementSet, config: &EngineConfig) -> SanitizerResult<Self> {
        Ok(Self {
            entries: set.compile(config)?,
            max_hits: config.max_search_hits,
            fallback_font_size: config.fallback_font_size,
        })
    }

    /// Processes every page, then finalizes the document.
    ///
    /// Page loading and finalization failures are fatal. A failed search
    /// skips the entry on that page and a failed cover skips the rectangle.
    pub fn redact_document<D: PagedDocument>(&self, doc: &mut D) -> SanitizerResult<PageOutcome> {
        let page_count = doc.page_count()?;
        let mut outcome = PageOutcome {
            pages_processed: page_count,
            ..Default::default()
        };

        if !self.entries.is_empty() {
            for index in 0..page_count {
                let mut page = doc.page(index)?;
                let applied = self.redact_page(&mut page, index, &mut outcome);
                if applied > 0 {
                    outcome.pages_changed += 1;
                    outcome.replacements += applied;
                }
            }
        }

        outcome.scrub = doc.finalize()?;
        tracing::info!(
            pages = outcome.pages_processed,
            changed = outcome.pages_changed,
            replacements = outcome.replacements,
            skipped = outcome.rects_skipped,
            "page redaction complete"
        );
        Ok(outcome)
    }

    /// Redacts one page and returns the number of covers applied.
    pub fn redact_page<P: PageSurface>(
        &self,
        page: &mut P,
        page_index: usize,
        outcome: &mut PageOutcome,
    ) -> usize {
        let mut applied_on_page = 0;

        for compiled in &self.entries {
            let hits = match page.search(&compiled.entry.original, self.max_hits) {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(page = page_index + 1, entry = compiled.index, error = %e, "search failed");
                    continue;
                }
            };
            if hits.is_empty() {
                continue;
            }

            let spans = page.spans().unwrap_or_else(|e| {
                tracing::warn!(page = page_index + 1, error = %e, "span index unavailable, using fallback style");
                Vec::new()
            });

            let mut pending = 0;
            for rect in hits {
                if compiled.pattern.is_word_bounded() {
                    match page.text_in(&rect) {
                        Ok(clip) if compiled.pattern.accepts_clip(&clip) => {}
                        Ok(_) => continue,
                        Err(e) => {
                            tracing::warn!(page = page_index + 1, error = %e, "could not read clipped text");
                            outcome.rects_skipped += 1;
                            continue;
                        }
                    }
                }

                let style = style_at(&spans, &rect, self.fallback_font_size);
                let cover = CoverAndRedraw::new(rect, &compiled.entry.replacement, style);
                match page.add_cover(&cover) {
                    Ok(()) => pending += 1,
                    Err(e) => {
                        tracing::warn!(page = page_index + 1, entry = compiled.index, error = %e, "skipping rectangle");
                        outcome.rects_skipped += 1;
                    }
                }
            }

            if pending == 0 {
                continue;
            }
            match page.apply_covers() {
                Ok(applied) => {
                    tracing::debug!(page = page_index + 1, entry = compiled.index, applied, "applied covers");
                    applied_on_page += applied;
                    if applied > 0 {
                        outcome.consumed.insert(compiled.index);
                    }
                }
                Err(e) => {
                    tracing::warn!(page = page_index + 1, entry = compiled.index, error = %e, "applying covers failed");
                    outcome.rects_skipped += pending;
                }
            }
        }

        applied_on_page
    }
}
