//! Email address domain logic.

use super::PatternMatcher;
use once_cell::sync::Lazy;
use regex::Regex;

/// Email address pattern matcher.
#[derive(Debug, Clone, Default)]
pub struct EmailMatcher;

impl EmailMatcher {
    /// Creates a new email matcher.
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}")
                .expect("Valid email regex")
        });
        &PATTERN
    }
}

impl PatternMatcher for EmailMatcher {
    fn kind(&self) -> &'static str {
        super::kind::EMAIL
    }

    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        Self::regex().find_iter(text).map(|m| m.as_str()).collect()
    }

    fn placeholder(&self, n: usize) -> String {
        format!("person_{}@example.com", n)
    }
}
