//! Deterministic supplementary scan for PII the detector missed.
//!
//! The net runs over the flattened document text after the detector list is
//! loaded. Anything it finds that the set does not already cover is appended
//! with the next sequential placeholder of its kind, so running it twice over
//! the same text adds nothing the second time.

use super::replacement::{kind, Replacement, ReplacementSet};
use super::{EmailMatcher, NationalIdMatcher, PatternMatcher, PhoneNumberMatcher};

/// Ordered collection of matchers run over the document text.
pub struct SafetyNet {
    matchers: Vec<Box<dyn PatternMatcher>>,
}

impl Default for SafetyNet {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyNet {
    /// Email, phone and identity number matchers, in that order.
    pub fn new() -> Self {
        Self {
            matchers: vec![
                Box::new(EmailMatcher::new()),
                Box::new(PhoneNumberMatcher::new()),
                Box::new(NationalIdMatcher::new()),
            ],
        }
    }

    /// Builds a net from custom matchers.
    pub fn with_matchers(matchers: Vec<Box<dyn PatternMatcher>>) -> Self {
        Self { matchers }
    }

    /// Scans `text` and appends uncovered matches to `set`.
    ///
    /// Returns the number of entries added.
    pub fn augment(&self, text: &str, set: &mut ReplacementSet) -> usize {
        let mut coverage = set.coverage();
        let mut counters = set.counters();
        let mut additions = Vec::new();

        for matcher in &self.matchers {
            for found in matcher.extract_all(text) {
                if found.is_empty() || coverage.is_covered(found) {
                    continue;
                }

                let n = match matcher.kind() {
                    kind::EMAIL => counters.next_email(),
                    kind::PHONE => counters.next_phone(),
                    _ => counters.next_id(),
                };
                let replacement = matcher.placeholder(n);
                tracing::debug!(
                    kind = matcher.kind(),
                    value = %mask_tail(found),
                    replacement = %replacement,
                    "safety net added entry"
                );

                coverage.insert(found);
                additions.push(Replacement::new(found, matcher.kind(), &replacement));
            }
        }

        let added = additions.len();
        set.extend(additions);
        if added > 0 {
            tracing::info!(added, total = set.len(), "safety net augmented replacement set");
        }
        added
    }
}

/// Masks all but the last four characters of a value for logging.
pub fn mask_tail(value: &str) -> String {
    let count = value.chars().count();
    let keep = count.min(4);
    let tail: String = value.chars().skip(count - keep).collect();
    format!("{}{}", "*".repeat(count - keep), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Contact priya.fernando92@finance.lk or +94 77 523 4567. NIC 923456789V.";

    #[test]
    fn test_adds_uncovered_values() {
        let mut set = ReplacementSet::new();
        let added = SafetyNet::new().augment(TEXT, &mut set);
        assert_eq!(added, 3);

        let by_original = |o: &str| set.iter().find(|e| e.original == o).cloned();
        assert_eq!(
            by_original("priya.fernando92@finance.lk").unwrap().replacement,
            "person_1@example.com"
        );
        assert_eq!(
            by_original("+94 77 523 4567").unwrap().replacement,
            "+00 00 000 0001"
        );
        assert_eq!(by_original("923456789V").unwrap().replacement, "ID_000001");
    }

    #[test]
    fn test_second_run_is_noop() {
        let net = SafetyNet::new();
        let mut set = ReplacementSet::new();
        net.augment(TEXT, &mut set);
        let snapshot = set.clone();

        assert_eq!(net.augment(TEXT, &mut set), 0);
        assert_eq!(set, snapshot);
    }

    #[test]
    fn test_numbering_continues_from_existing_entries() {
        let mut set = ReplacementSet::from_entries(vec![Replacement::new(
            "kamal@corp.lk",
            kind::EMAIL,
            "person_1@example.com",
        )]);
        SafetyNet::new().augment("mail nimal@corp.lk", &mut set);
        let added = set.iter().find(|e| e.original == "nimal@corp.lk").unwrap();
        assert_eq!(added.replacement, "person_2@example.com");
    }

    #[test]
    fn test_dotted_email_variant_is_covered() {
        let mut set = ReplacementSet::from_entries(vec![Replacement::new(
            "johndoe@x.com",
            kind::EMAIL,
            "person_1@example.com",
        )]);
        assert_eq!(SafetyNet::new().augment("write john.doe@x.com", &mut set), 0);
    }

    #[test]
    fn test_mask_tail() {
        assert_eq!(mask_tail("0775234567"), "******4567");
        assert_eq!(mask_tail("ab"), "ab");
    }
}
