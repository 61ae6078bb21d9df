//! Custom assertions for sanitize testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use super::fixtures::read_part;
use std::path::Path;

fn extract_text_or_panic(path: &Path) -> String {
    pii_sanitizer::extract_text(path)
        .unwrap_or_else(|e| panic!("Failed to extract text from '{}': {}", path.display(), e))
}

/// Asserts that `pattern` no longer appears in the document text.
///
/// # Panics
/// Panics if the pattern is still found.
pub fn assert_redacted(path: &Path, pattern: &str) {
    let text = extract_text_or_panic(path);
    assert!(
        !text.contains(pattern),
        "Pattern '{}' should be replaced but was found in '{}'.\nExtracted text length: {} chars",
        pattern,
        path.display(),
        text.len()
    );
}

/// Asserts that `pattern` is still present in the document text.
///
/// # Panics
/// Panics if the pattern is not found.
pub fn assert_preserved(path: &Path, pattern: &str) {
    let text = extract_text_or_panic(path);
    assert!(
        text.contains(pattern),
        "Pattern '{}' should be preserved but was not found in '{}'",
        pattern,
        path.display()
    );
}

/// Asserts that the file is a PDF lopdf can load.
///
/// # Panics
/// Panics if the file is missing, empty or unparsable.
pub fn assert_valid_pdf(path: &Path) {
    let metadata = std::fs::metadata(path)
        .unwrap_or_else(|e| panic!("PDF should exist at '{}': {}", path.display(), e));
    assert!(metadata.len() > 0, "PDF should not be empty at '{}'", path.display());
    assert!(
        lopdf::Document::load(path).is_ok(),
        "PDF at '{}' should be loadable",
        path.display()
    );
}

/// Asserts that a package part contains `needle`.
///
/// # Panics
/// Panics if the part is missing or lacks the needle.
pub fn assert_part_contains(path: &Path, part: &str, needle: &str) {
    let xml = read_part(path, part)
        .ok()
        .flatten()
        .unwrap_or_else(|| panic!("Part '{}' missing from '{}'", part, path.display()));
    assert!(xml.contains(needle), "Part '{}' should contain '{}':\n{}", part, needle, xml);
}

/// Asserts that a package part, if present, does not contain `needle`.
///
/// # Panics
/// Panics if the needle is found.
pub fn assert_part_lacks(path: &Path, part: &str, needle: &str) {
    if let Some(xml) = read_part(path, part).ok().flatten() {
        assert!(!xml.contains(needle), "Part '{}' should not contain '{}':\n{}", part, needle, xml);
    }
}
