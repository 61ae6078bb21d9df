//! Replacement records and the longest-first replacement set.
//!
//! Candidates arrive loosely typed from the detector. They are validated
//! here into [`Replacement`] values and ordered so that an original that is a
//! substring of another is always applied after the longer one.

use super::pattern::{CompiledEntry, SearchPattern};
use crate::config::EngineConfig;
use crate::error::SanitizerResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Kind tags with special meaning for counters and coverage.
pub mod kind {
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const ID_NUMBER: &str = "id_number";

    /// Tags counted as identity numbers.
    pub const ID_KINDS: [&str; 4] = ["id_number", "nic", "passport", "ssn"];
}

/// Loosely typed (original, type, replacement) record from the detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplacementCandidate {
    #[serde(default)]
    pub original: Option<Value>,

    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,

    #[serde(default)]
    pub replacement: Option<Value>,
}

impl ReplacementCandidate {
    /// Creates a candidate from plain strings.
    pub fn new(original: &str, kind: &str, replacement: &str) -> Self {
        Self {
            original: Some(Value::String(original.to_string())),
            kind: Some(kind.to_string()),
            replacement: Some(Value::String(replacement.to_string())),
        }
    }

    /// Parses a JSON array of candidates.
    pub fn parse_list(json: &str) -> SanitizerResult<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates the candidate. Returns `None` for an empty original or a
    /// missing/non-scalar replacement.
    pub fn validate(&self) -> Option<Replacement> {
        let original = self.original.as_ref().and_then(scalar_text)?;
        let replacement = self.replacement.as_ref().and_then(scalar_text)?;
        if original.is_empty() {
            return None;
        }
        Some(Replacement {
            original,
            kind: self.kind.clone().unwrap_or_default(),
            replacement,
        })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A validated replacement entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Replacement {
    pub original: String,
    pub kind: String,
    pub replacement: String,
}

impl Replacement {
    pub fn new(original: &str, kind: &str, replacement: &str) -> Self {
        Self {
            original: original.to_string(),
            kind: kind.to_string(),
            replacement: replacement.to_string(),
        }
    }

    /// Length used for ordering, in characters.
    pub fn len(&self) -> usize {
        self.original.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn is_email(&self) -> bool {
        self.kind == kind::EMAIL
    }

    pub fn is_phone(&self) -> bool {
        self.kind == kind::PHONE
    }

    pub fn is_id(&self) -> bool {
        kind::ID_KINDS.contains(&self.kind.as_str())
    }
}

/// Longest-first ordered, deduplicated replacement entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReplacementSet {
    entries: Vec<Replacement>,
}

impl ReplacementSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw detector candidates, dropping invalid ones.
    pub fn from_candidates(candidates: &[ReplacementCandidate]) -> Self {
        let total = candidates.len();
        let mut set = Self::new();
        set.extend(candidates.iter().filter_map(ReplacementCandidate::validate));
        let dropped = total.saturating_sub(set.len());
        if dropped > 0 {
            tracing::debug!(dropped, kept = set.len(), "dropped invalid or duplicate candidates");
        }
        set
    }

    /// Builds a set from already validated entries.
    pub fn from_entries(entries: impl IntoIterator<Item = Replacement>) -> Self {
        let mut set = Self::new();
        set.extend(entries);
        set
    }

    /// Appends entries, skipping exact duplicate originals, then restores the
    /// longest-first order. The sort is stable so ties keep insertion order.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = Replacement>) {
        let mut seen: HashSet<String> = self.entries.iter().map(|e| e.original.clone()).collect();
        for entry in entries {
            if entry.is_empty() || !seen.insert(entry.original.clone()) {
                continue;
            }
            self.entries.push(entry);
        }
        self.entries.sort_by_key(|e| std::cmp::Reverse(e.len()));
    }

    pub fn push(&mut self, entry: Replacement) {
        self.extend(std::iter::once(entry));
    }

    pub fn entries(&self) -> &[Replacement] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coverage index over the current originals.
    pub fn coverage(&self) -> Coverage {
        let mut coverage = Coverage::default();
        for entry in &self.entries {
            coverage.insert(&entry.original);
        }
        coverage
    }

    /// Per-kind counters over the current entries.
    pub fn counters(&self) -> KindCounters {
        KindCounters {
            email: self.entries.iter().filter(|e| e.is_email()).count(),
            phone: self.entries.iter().filter(|e| e.is_phone()).count(),
            id: self.entries.iter().filter(|e| e.is_id()).count(),
        }
    }

    /// Compiles a search pattern for every entry, in set order.
    pub fn compile(&self, config: &EngineConfig) -> SanitizerResult<Vec<CompiledEntry<'_>>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Ok(CompiledEntry {
                    index,
                    entry,
                    pattern: SearchPattern::for_original(
                        &entry.original,
                        config.short_token_max_len,
                    )?,
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ReplacementSet {
    type Item = &'a Replacement;
    type IntoIter = std::slice::Iter<'a, Replacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Lower-cases a value for coverage comparison.
pub fn normalize_key(value: &str) -> String {
    value.to_lowercase()
}

/// Lower-cases an email and removes dots from its local part, so
/// `john.doe@x.com` and `johndoe@x.com` compare equal.
pub fn normalize_email(value: &str) -> String {
    let lowered = value.to_lowercase();
    match lowered.rfind('@') {
        Some(at) => {
            let (local, domain) = lowered.split_at(at);
            let mut normalized: String = local.chars().filter(|c| *c != '.').collect();
            normalized.push_str(domain);
            normalized
        }
        None => lowered,
    }
}

/// Set of normalized originals already covered by the replacement set.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    keys: HashSet<String>,
}

impl Coverage {
    pub fn insert(&mut self, original: &str) {
        self.keys.insert(normalize_key(original));
        if original.contains('@') {
            self.keys.insert(normalize_email(original));
        }
    }

    pub fn is_covered(&self, candidate: &str) -> bool {
        self.keys.contains(&normalize_key(candidate))
            || (candidate.contains('@') && self.keys.contains(&normalize_email(candidate)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Running per-kind counters so new placeholders continue numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounters {
    pub email: usize,
    pub phone: usize,
    pub id: usize,
}

impl KindCounters {
    pub fn next_email(&mut self) -> usize {
        self.email += 1;
        self.email
    }

    pub fn next_phone(&mut self) -> usize {
        self.phone += 1;
        self.phone
    }

    pub fn next_id(&mut self) -> usize {
        self.id += 1;
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_first_with_stable_ties() {
        let set = ReplacementSet::from_entries(vec![
            Replacement::new("Priya", "person", "Person_1"),
            Replacement::new("Kamal", "person", "Person_2"),
            Replacement::new("Priya Anjali Fernando", "person", "Person_1"),
        ]);
        let originals: Vec<&str> = set.iter().map(|e| e.original.as_str()).collect();
        assert_eq!(originals, vec!["Priya Anjali Fernando", "Priya", "Kamal"]);
    }

    #[test]
    fn test_invalid_candidates_dropped() {
        let candidates = vec![
            ReplacementCandidate::new("", "person", "Person_1"),
            ReplacementCandidate {
                original: Some(Value::String("John".into())),
                kind: None,
                replacement: None,
            },
            ReplacementCandidate {
                original: Some(serde_json::json!(771234567)),
                kind: Some("phone".into()),
                replacement: Some(Value::String("+00 00 000 0001".into())),
            },
        ];
        let set = ReplacementSet::from_candidates(&candidates);
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].original, "771234567");
        assert!(set.entries()[0].is_phone());
    }

    #[test]
    fn test_duplicate_originals_keep_first() {
        let set = ReplacementSet::from_entries(vec![
            Replacement::new("Nimal", "person", "Person_1"),
            Replacement::new("Nimal", "person", "Person_9"),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].replacement, "Person_1");
    }

    #[test]
    fn test_parse_list_accepts_kind_alias() {
        let parsed = ReplacementCandidate::parse_list(
            r#"[{"original": "a@b.com", "kind": "email", "replacement": "x@example.com"}]"#,
        )
        .unwrap();
        assert_eq!(parsed[0].kind.as_deref(), Some("email"));
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("John.Doe@X.com"), "johndoe@x.com");
        assert_eq!(normalize_email("plain"), "plain");

        let mut coverage = Coverage::default();
        coverage.insert("john.doe@x.com");
        assert!(coverage.is_covered("johndoe@x.com"));
        assert!(coverage.is_covered("JOHN.DOE@x.com"));
        assert!(!coverage.is_covered("jane@x.com"));
    }

    #[test]
    fn test_counters_continue_numbering() {
        let set = ReplacementSet::from_entries(vec![
            Replacement::new("a@b.com", "email", "person_1@example.com"),
            Replacement::new("991234567V", "nic", "ID_000001"),
        ]);
        let mut counters = set.counters();
        assert_eq!(counters.next_email(), 2);
        assert_eq!(counters.next_phone(), 1);
        assert_eq!(counters.next_id(), 2);
    }
}
