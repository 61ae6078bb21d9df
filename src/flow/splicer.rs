//! Cross-fragment splicing.
//!
//! The splicer flattens a container's fragments into one string plus a
//! boundary map, finds the next match of a pattern and rewrites only the
//! fragments the match overlaps.

use super::TextFragment;
use crate::domain::SearchPattern;
use std::ops::Range;

/// Concatenated text of a container and the byte range owned by each
/// fragment. Rebuilt after every splice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentLayout {
    pub text: String,
    pub bounds: Vec<Range<usize>>,
}

impl FragmentLayout {
    pub fn build<T: TextFragment>(fragments: &[T]) -> Self {
        let mut text = String::new();
        let mut bounds = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let start = text.len();
            text.push_str(&fragment.text());
            bounds.push(start..text.len());
        }
        Self { text, bounds }
    }

    /// Indices of the non-empty fragments overlapping `range`.
    pub fn overlapping(&self, range: &Range<usize>) -> Vec<usize> {
        self.bounds
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_empty() && b.start < range.end && range.start < b.end)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Byte ranges of replacement text already written into a container.
/// Matches overlapping them are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenRanges {
    ranges: Vec<Range<usize>>,
}

impl WrittenRanges {
    /// Records that `matched` was replaced by `written_len` bytes, shifting
    /// the ranges that follow it.
    pub fn record(&mut self, matched: Range<usize>, written_len: usize) {
        let removed = matched.end - matched.start;
        for range in &mut self.ranges {
            if range.start >= matched.end {
                range.start = range.start + written_len - removed;
                range.end = range.end + written_len - removed;
            }
        }
        self.ranges.push(matched.start..matched.start + written_len);
    }

    /// The written range overlapping `range`, if any.
    pub fn overlap(&self, range: &Range<usize>) -> Option<&Range<usize>> {
        self.ranges
            .iter()
            .find(|w| w.start < range.end && range.start < w.end)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// First match of `pattern` in `text` that does not overlap written text.
pub fn next_match(
    text: &str,
    pattern: &SearchPattern,
    written: &WrittenRanges,
) -> Option<Range<usize>> {
    let mut start = 0;
    while start <= text.len() {
        let found = pattern.find_at(text, start)?;
        match written.overlap(&found) {
            Some(w) => start = w.end,
            None => return Some(found),
        }
    }
    None
}

/// Rewrites the fragments overlapping `range` so the container text reads
/// `replacement` in its place. Returns how many fragments were touched.
///
/// The first overlapping fragment keeps its prefix and takes the
/// replacement, interior fragments are emptied and the last keeps its
/// suffix.
pub fn splice<T: TextFragment>(
    fragments: &mut [T],
    layout: &FragmentLayout,
    range: Range<usize>,
    replacement: &str,
) -> usize {
    let touched = layout.overlapping(&range);
    let (Some(&first), Some(&last)) = (touched.first(), touched.last()) else {
        return 0;
    };

    let prefix = &layout.text[layout.bounds[first].start..range.start];
    let suffix = &layout.text[range.end..layout.bounds[last].end];

    if first == last {
        fragments[first].set_text(&format!("{}{}{}", prefix, replacement, suffix));
        return 1;
    }

    fragments[first].set_text(&format!("{}{}", prefix, replacement));
    for &interior in &touched[1..touched.len() - 1] {
        fragments[interior].set_text("");
    }
    fragments[last].set_text(suffix);
    touched.len()
}
