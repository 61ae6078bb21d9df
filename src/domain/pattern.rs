//! Search patterns for replacement originals.
//!
//! Short all-caps tokens such as `IT` or `HR` are matched case-sensitively on
//! word boundaries so they never fire inside `within` or `audit`. Every other
//! original is an escaped literal matched case-insensitively, where a space
//! also matches the tab or line break a document may put between words.

use super::replacement::Replacement;
use crate::error::{SanitizerError, SanitizerResult};
use regex::{NoExpand, Regex, RegexBuilder};
use std::ops::Range;

/// Returns true if `original` is a short, all-uppercase alphabetic token.
pub fn needs_word_boundary(original: &str, max_len: usize) -> bool {
    let count = original.chars().count();
    count > 0
        && count <= max_len
        && original
            .chars()
            .all(|c| c.is_alphabetic() && c.is_uppercase())
}

/// A compiled matcher for one replacement original.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
    original: String,
    word_bounded: bool,
}

impl SearchPattern {
    /// Builds the pattern for `original`.
    pub fn for_original(original: &str, short_token_max_len: usize) -> SanitizerResult<Self> {
        let escaped = regex::escape(original).replace(' ', r"[ \t\n]");
        let word_bounded = needs_word_boundary(original, short_token_max_len);
        let regex = if word_bounded {
            Regex::new(&format!(r"\b{}\b", escaped))
        } else {
            RegexBuilder::new(&escaped).case_insensitive(true).build()
        }
        .map_err(|e| SanitizerError::PatternError {
            pattern: original.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            regex,
            original: original.to_string(),
            word_bounded,
        })
    }

    pub fn is_word_bounded(&self) -> bool {
        self.word_bounded
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// First match starting at or after byte offset `start`.
    pub fn find_at(&self, text: &str, start: usize) -> Option<Range<usize>> {
        self.regex.find_at(text, start).map(|m| m.range())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replaces every match in `text` with the literal `replacement`.
    /// Returns the new text and the number of matches replaced.
    pub fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        let count = self.regex.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        (
            self.regex.replace_all(text, NoExpand(replacement)).into_owned(),
            count,
        )
    }

    /// Decides whether text clipped from a page hit counts as a match.
    /// Page search is case-insensitive, so short tokens need a
    /// case-sensitive confirmation.
    pub fn accepts_clip(&self, clip: &str) -> bool {
        !self.word_bounded || clip.trim().contains(self.original.as_str())
    }
}

/// A replacement entry paired with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledEntry<'s> {
    /// Position of the entry in its set
    pub index: usize,
    pub entry: &'s Replacement,
    pub pattern: SearchPattern,
}
