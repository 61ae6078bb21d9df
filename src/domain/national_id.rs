//! National identity number domain logic.
//!
//! Detects the two common identity card layouts: nine digits followed by a
//! `V` or `X` letter, and bare twelve-digit numbers. Neither may be part of a
//! longer digit run.

use super::{digit_run_is_isolated, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Identity number pattern matcher.
#[derive(Debug, Clone, Default)]
pub struct NationalIdMatcher;

impl NationalIdMatcher {
    /// Creates a new identity number matcher.
    pub fn new() -> Self {
        Self
    }

    fn lettered() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[0-9]+[VvXx]").expect("Valid lettered ID regex"));
        &PATTERN
    }

    fn twelve_digits() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[0-9]{12,}").expect("Valid numeric ID regex"));
        &PATTERN
    }
}

impl PatternMatcher for NationalIdMatcher {
    fn kind(&self) -> &'static str {
        super::kind::ID_NUMBER
    }

    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut found: Vec<&'a str> = Self::lettered()
            .find_iter(text)
            .filter(|m| m.len() == 10 && digit_run_is_isolated(text, m.start(), m.end()))
            .map(|m| m.as_str())
            .collect();

        found.extend(
            Self::twelve_digits()
                .find_iter(text)
                .filter(|m| m.len() == 12 && digit_run_is_isolated(text, m.start(), m.end()))
                .map(|m| m.as_str()),
        );
        found
    }

    fn placeholder(&self, n: usize) -> String {
        format!("ID_{:06}", n)
    }
}
