//! Domain models and business logic for replacement planning.
//!
//! This module holds the replacement set, the search patterns derived from
//! it, the deterministic safety-net matchers and the standard font mapping
//! used when replacement text has to be redrawn on a page.

pub mod email;
pub mod fonts;
pub mod national_id;
pub mod pattern;
pub mod phone;
pub mod replacement;
pub mod safety_net;

pub use email::EmailMatcher;
pub use fonts::{StandardFont, StyleFlags};
pub use national_id::NationalIdMatcher;
pub use pattern::{needs_word_boundary, CompiledEntry, SearchPattern};
pub use phone::PhoneNumberMatcher;
pub use replacement::{
    kind, normalize_email, normalize_key, Coverage, KindCounters, Replacement,
    ReplacementCandidate, ReplacementSet,
};
pub use safety_net::SafetyNet;

/// Trait for deterministic PII pattern matchers.
pub trait PatternMatcher: Send + Sync {
    /// Kind tag given to entries this matcher adds.
    fn kind(&self) -> &'static str;

    /// All matches in `text`, in scan order.
    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// The `n`th sequential placeholder for this kind.
    fn placeholder(&self, n: usize) -> String;
}

/// True if the byte range `start..end` is not preceded or followed by an
/// ASCII digit.
pub(crate) fn digit_run_is_isolated(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
}
