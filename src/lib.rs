//! Layout-preserving PII replacement for DOCX and PDF documents.
//!
//! Given an ordered set of (original → replacement) pairs, the library finds
//! every occurrence of each original in a document and rewrites only the
//! text units that hold it. Formatting, spacing and unrelated content are
//! left alone, even when a match straddles several independently styled
//! fragments.
//!
//! # Features
//!
//! - **Longest-first replacement set**: dedup, ordering and counters for
//!   sequential placeholders
//! - **Regex safety net**: adds uncovered emails, phone numbers and national
//!   IDs with fresh placeholders
//! - **Cross-fragment splicing**: matches spanning DOCX runs or rich-text
//!   fragments are rewritten without touching style handles
//! - **Secure page redaction**: PDF glyphs are removed with MuPDF and the
//!   replacement is redrawn in a matching standard font
//!
//! # Architecture
//!
//! - [`domain`]: replacement records, matchers, search patterns, fonts
//! - [`flow`]: the splicer and the flowing-container abstraction
//! - [`page`]: the page redaction engine and the fixed-layout abstraction
//! - [`backend`]: DOCX and PDF adapters
//! - [`redaction`]: strategies and the service layer
//! - [`error`]: error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use pii_sanitizer::{EngineConfig, ReplacementCandidate, SanitizeService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = SanitizeService::new(EngineConfig::default())?;
//! let candidates = vec![ReplacementCandidate::new("Priya Fernando", "name", "Person_1")];
//!
//! service.sanitize(
//!     Path::new("contract.docx"),
//!     Path::new("contract.sanitized.docx"),
//!     &candidates,
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Examples
//!
//! ## Splicing a rich-text line
//!
//! ```
//! use pii_sanitizer::flow::{FlowEngine, StyledLine};
//! use pii_sanitizer::{EngineConfig, Replacement, ReplacementSet};
//!
//! let set = ReplacementSet::from_entries([Replacement::new("john doe", "name", "Person_1")]);
//! let engine = FlowEngine::new(&set, &EngineConfig::default()).unwrap();
//!
//! let mut line = StyledLine::from_texts(&["Contact JO", "HN DOE today"]);
//! let outcome = engine.sanitize_container(&mut line);
//! assert_eq!(outcome.replacements, 1);
//! assert_eq!(line.text(), "Contact Person_1 today");
//! ```
//!
//! ## Safety net
//!
//! ```
//! use pii_sanitizer::{ReplacementSet, SafetyNet};
//!
//! let mut set = ReplacementSet::new();
//! let added = SafetyNet::new().augment("Mail jane@corp.com", &mut set);
//! assert_eq!(added, 1);
//! assert_eq!(set.entries()[0].replacement, "person_1@example.com");
//! ```

pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod flow;
pub mod page;
pub mod redaction;

pub use config::EngineConfig;
pub use domain::{
    EmailMatcher, NationalIdMatcher, PatternMatcher, PhoneNumberMatcher, Replacement,
    ReplacementCandidate, ReplacementSet, SafetyNet,
};
pub use error::{SanitizerError, SanitizerResult};
pub use flow::FlowEngine;
pub use page::PageRedactionEngine;
pub use redaction::{
    DocumentFormat, DocxStrategy, Plan, SanitizeService, SanitizeStats, SanitizeStrategy,
    SecurePdfStrategy,
};

/// Extracts the flattened text of a DOCX or PDF document.
pub fn extract_text(input: &std::path::Path) -> SanitizerResult<String> {
    SanitizeService::new(EngineConfig::default())?.extract_text(input)
}
