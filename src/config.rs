//! Engine configuration.
//!
//! All bounds used by the engines live here and are handed to them as a
//! plain argument; nothing in the core reads global state.

use crate::error::{SanitizerError, SanitizerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for one sanitize operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum splices per entry per container before the entry is abandoned
    pub max_splice_iterations: usize,

    /// Originals up to this many characters, all-uppercase and alphabetic,
    /// are matched case-sensitively on word boundaries
    pub short_token_max_len: usize,

    /// Maximum search hits per entry per page
    pub max_search_hits: u32,

    /// Run the regex safety net over the document text
    pub safety_net: bool,

    /// Replace inline pictures in DOCX documents with text placeholders
    pub image_placeholders: bool,

    /// Font size used when no glyph span overlaps a page match
    pub fallback_font_size: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_splice_iterations: 50,
            short_token_max_len: 3,
            max_search_hits: 100,
            safety_net: true,
            image_placeholders: true,
            fallback_font_size: 11.0,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> SanitizerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| SanitizerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| SanitizerError::InvalidInput {
            parameter: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the splice iteration bound.
    pub fn with_max_splice_iterations(mut self, max: usize) -> Self {
        self.max_splice_iterations = max;
        self
    }

    /// Sets the maximum number of search hits per entry per page.
    pub fn with_max_search_hits(mut self, max_hits: u32) -> Self {
        self.max_search_hits = max_hits;
        self
    }

    /// Enables or disables the regex safety net.
    pub fn with_safety_net(mut self, enabled: bool) -> Self {
        self.safety_net = enabled;
        self
    }

    /// Enables or disables DOCX picture placeholders.
    pub fn with_image_placeholders(mut self, enabled: bool) -> Self {
        self.image_placeholders = enabled;
        self
    }

    /// Rejects bounds that would make the engines do nothing or loop forever.
    pub fn validate(&self) -> SanitizerResult<()> {
        if self.max_splice_iterations == 0 {
            return Err(invalid("max_splice_iterations", "must be at least 1"));
        }
        if self.max_search_hits == 0 {
            return Err(invalid("max_search_hits", "must be at least 1"));
        }
        if !(self.fallback_font_size > 0.0) {
            return Err(invalid("fallback_font_size", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(parameter: &str, reason: &str) -> SanitizerError {
    SanitizerError::InvalidInput {
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_splice_iterations, 50);
        assert_eq!(config.short_token_max_len, 3);
        assert!(config.safety_net);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_search_hits": 7}"#).unwrap();
        assert_eq!(config.max_search_hits, 7);
        assert_eq!(config.max_splice_iterations, 50);
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let config = EngineConfig::default().with_max_splice_iterations(0);
        assert!(config.validate().is_err());

        let config = EngineConfig {
            fallback_font_size: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
