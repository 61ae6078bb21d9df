//! Phone number domain logic.
//!
//! Covers international `+CC` numbers, parenthesized or dashed local numbers
//! and bare digit runs. Anything with fewer than seven digits is treated as a
//! year, amount or reference and skipped.

use super::{digit_run_is_isolated, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum digit count for a phone candidate.
pub const MIN_PHONE_DIGITS: usize = 7;

/// Phone number pattern matcher.
///
/// Supported shapes:
/// - +94 77 523 4567, +1-555-123-4567
/// - (077) 523 4567, 077-523-4567, 011.234.5678
/// - 0775234567 (10 to 12 digits, not part of a longer digit run)
#[derive(Debug, Clone, Default)]
pub struct PhoneNumberMatcher;

impl PhoneNumberMatcher {
    /// Creates a new phone number matcher.
    pub fn new() -> Self {
        Self
    }

    fn international() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\+[0-9]{1,3}[\s\-]?[0-9]{1,4}[\s\-]?[0-9]{2,4}[\s\-]?[0-9]{3,4}")
                .expect("Valid international phone regex")
        });
        &PATTERN
    }

    fn local() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\(?[0-9]{3,4}\)?[\s\-.][0-9]{3,4}[\s\-.][0-9]{3,4}")
                .expect("Valid local phone regex")
        });
        &PATTERN
    }

    fn digit_run() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[0-9]{10,12}").expect("Valid digit run regex"));
        &PATTERN
    }

    /// Counts the digits in a candidate.
    pub fn digit_count(text: &str) -> usize {
        text.chars().filter(|c| c.is_ascii_digit()).count()
    }
}

impl PatternMatcher for PhoneNumberMatcher {
    fn kind(&self) -> &'static str {
        super::kind::PHONE
    }

    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut found: Vec<&'a str> = Vec::new();

        for pattern in [Self::international(), Self::local()] {
            found.extend(pattern.find_iter(text).map(|m| m.as_str().trim()));
        }

        found.extend(
            Self::digit_run()
                .find_iter(text)
                .filter(|m| digit_run_is_isolated(text, m.start(), m.end()))
                .map(|m| m.as_str()),
        );

        found.retain(|phone| Self::digit_count(phone) >= MIN_PHONE_DIGITS);
        found
    }

    fn placeholder(&self, n: usize) -> String {
        format!("+00 00 000 {:04}", n)
    }
}
