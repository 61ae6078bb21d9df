//! Flowing-text replacement.
//!
//! A flowing container is anything whose visible text is the ordered
//! concatenation of styled fragments: a word-processing paragraph and its
//! runs, or the in-memory [`StyledLine`]. The [`FlowEngine`] unwraps
//! hyperlinks, splices every replacement across fragment boundaries and
//! finally runs a degraded-mode pass over text the container could not
//! expose as fragments.

pub mod line;
pub mod splicer;

pub use line::{Fragment, Inline, StyleHandle, StyledLine};
pub use splicer::{next_match, splice, FragmentLayout, WrittenRanges};

use crate::config::EngineConfig;
use crate::domain::{CompiledEntry, ReplacementSet};
use crate::error::SanitizerResult;
use std::collections::BTreeSet;

/// A styled piece of text whose payload can be rewritten in place.
pub trait TextFragment {
    fn text(&self) -> String;

    /// Replaces the text payload. Styling is left untouched.
    fn set_text(&mut self, text: &str);
}

impl<T: TextFragment + ?Sized> TextFragment for &mut T {
    fn text(&self) -> String {
        (**self).text()
    }

    fn set_text(&mut self, text: &str) {
        (**self).set_text(text)
    }
}

/// A container of ordered text fragments.
pub trait FlowContainer {
    type Fragment<'a>: TextFragment
    where
        Self: 'a;

    /// Promotes fragments wrapped in hyperlinks to direct children and
    /// drops the wrappers. Returns the discarded link targets.
    fn unwrap_links(&mut self) -> Vec<String>;

    /// Direct child fragments, in visible order.
    fn fragments(&mut self) -> Vec<Self::Fragment<'_>>;

    /// Text nodes that are not reachable as direct fragments.
    fn loose_fragments(&mut self) -> Vec<Self::Fragment<'_>>;
}

/// What happened to one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerOutcome {
    pub replacements: usize,
    pub links_unwrapped: usize,
    pub discarded_targets: Vec<String>,
    pub degraded_rewrites: usize,
    pub limit_hits: usize,
    /// Indices of entries that matched at least once
    pub consumed: BTreeSet<usize>,
}

impl ContainerOutcome {
    /// True if any text was rewritten or any link unwrapped.
    pub fn changed(&self) -> bool {
        self.replacements > 0 || self.links_unwrapped > 0
    }
}

/// Applies a replacement set to flowing containers.
#[derive(Debug)]
pub struct FlowEngine<'s> {
    entries: Vec<CompiledEntry<'s>>,
    max_iterations: usize,
}

impl<'s> FlowEngine<'s> {
    /// Compiles the patterns for `set`.
    pub fn new(set: &'s ReplacementSet, config: &EngineConfig) -> SanitizerResult<Self> {
        Ok(Self {
            entries: set.compile(config)?,
            max_iterations: config.max_splice_iterations,
        })
    }

    /// Number of compiled entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites every occurrence of every entry inside `container`.
    pub fn sanitize_container<C: FlowContainer>(&self, container: &mut C) -> ContainerOutcome {
        let mut outcome = ContainerOutcome::default();
        if self.entries.is_empty() {
            return outcome;
        }

        outcome.discarded_targets = container.unwrap_links();
        outcome.links_unwrapped = outcome.discarded_targets.len();

        self.structural_pass(container, &mut outcome);
        self.degraded_pass(container, &mut outcome);
        outcome
    }

    fn structural_pass<C: FlowContainer>(&self, container: &mut C, outcome: &mut ContainerOutcome) {
        let mut fragments = container.fragments();
        if fragments.is_empty() {
            return;
        }
        let mut written = WrittenRanges::default();

        for compiled in &self.entries {
            let mut iterations = 0;
            loop {
                let layout = FragmentLayout::build(&fragments);
                let Some(range) = next_match(&layout.text, &compiled.pattern, &written) else {
                    break;
                };
                if iterations == self.max_iterations {
                    tracing::warn!(
                        entry = compiled.index,
                        kind = %compiled.entry.kind,
                        limit = self.max_iterations,
                        "iteration limit reached, abandoning entry for this container"
                    );
                    outcome.limit_hits += 1;
                    break;
                }

                let replacement = &compiled.entry.replacement;
                let touched = splice(&mut fragments, &layout, range.clone(), replacement);
                written.record(range.clone(), replacement.len());
                tracing::debug!(
                    entry = compiled.index,
                    start = range.start,
                    end = range.end,
                    fragments = touched,
                    "spliced replacement"
                );

                iterations += 1;
                outcome.replacements += 1;
                outcome.consumed.insert(compiled.index);
            }
        }
    }

    fn degraded_pass<C: FlowContainer>(&self, container: &mut C, outcome: &mut ContainerOutcome) {
        let mut loose = container.loose_fragments();
        if loose.is_empty() {
            return;
        }

        for compiled in &self.entries {
            for fragment in loose.iter_mut() {
                let text = fragment.text();
                let (rewritten, count) = compiled
                    .pattern
                    .replace_all(&text, &compiled.entry.replacement);
                if count == 0 {
                    continue;
                }
                fragment.set_text(&rewritten);
                tracing::warn!(
                    entry = compiled.index,
                    count,
                    "degraded-mode rewrite of text outside direct fragments"
                );
                outcome.degraded_rewrites += count;
                outcome.replacements += count;
                outcome.consumed.insert(compiled.index);
            }
        }
    }
}
