//! Sanitize strategies and the service that drives them.
//!
//! The service turns detector candidates into a replacement set, runs the
//! safety net over the document text and dispatches to the strategy for the
//! input's format.

pub mod docx;
pub mod pdf;
pub mod strategy;

pub use docx::DocxStrategy;
pub use pdf::SecurePdfStrategy;
pub use strategy::{DocumentFormat, SanitizeStats, SanitizeStrategy};

use crate::config::EngineConfig;
use crate::domain::{ReplacementCandidate, ReplacementSet, SafetyNet};
use crate::error::{SanitizerError, SanitizerResult};
use serde::Serialize;
use std::path::Path;

/// The final replacement set for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    #[serde(rename = "entries")]
    pub set: ReplacementSet,
    pub safety_net_added: usize,
}

/// Sanitize service coordinating planning and strategy execution.
pub struct SanitizeService {
    config: EngineConfig,
    safety_net: SafetyNet,
}

impl std::fmt::Debug for SanitizeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitizeService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SanitizeService {
    /// Creates a service, rejecting an invalid configuration.
    pub fn new(config: EngineConfig) -> SanitizerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            safety_net: SafetyNet::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reads a JSON array of candidates.
    pub fn load_candidates(path: &Path) -> SanitizerResult<Vec<ReplacementCandidate>> {
        let json = std::fs::read_to_string(path).map_err(|e| SanitizerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        ReplacementCandidate::parse_list(&json)
    }

    /// Returns the strategy for `format`.
    pub fn strategy_for(&self, format: DocumentFormat) -> Box<dyn SanitizeStrategy> {
        match format {
            DocumentFormat::Docx => Box::new(DocxStrategy::new(self.config.clone())),
            DocumentFormat::Pdf => Box::new(SecurePdfStrategy::new(self.config.clone())),
        }
    }

    fn strategy_for_path(&self, input: &Path) -> SanitizerResult<Box<dyn SanitizeStrategy>> {
        Ok(self.strategy_for(DocumentFormat::from_path(input)?))
    }

    /// Builds the replacement set for `input`, extended by the safety net
    /// when it is enabled.
    pub fn plan(&self, input: &Path, candidates: &[ReplacementCandidate]) -> SanitizerResult<Plan> {
        ensure_exists(input)?;
        let mut set = ReplacementSet::from_candidates(candidates);
        let mut safety_net_added = 0;

        if self.config.safety_net {
            let text = self.extract_text(input)?;
            safety_net_added = self.safety_net.augment(&text, &mut set);
        }
        Ok(Plan { set, safety_net_added })
    }

    /// Plans and sanitizes `input` into `output`.
    pub fn sanitize(
        &self,
        input: &Path,
        output: &Path,
        candidates: &[ReplacementCandidate],
    ) -> SanitizerResult<SanitizeStats> {
        let plan = self.plan(input, candidates)?;
        let mut stats = self.sanitize_with_set(input, output, &plan.set)?;
        stats.safety_net_added = plan.safety_net_added;
        Ok(stats)
    }

    /// Sanitizes with a ready replacement set. An empty set copies the input
    /// unchanged.
    pub fn sanitize_with_set(
        &self,
        input: &Path,
        output: &Path,
        set: &ReplacementSet,
    ) -> SanitizerResult<SanitizeStats> {
        ensure_exists(input)?;
        let strategy = self.strategy_for_path(input)?;

        if set.is_empty() {
            tracing::info!(input = %input.display(), "empty replacement set, copying input");
            std::fs::copy(input, output).map_err(|e| SanitizerError::Io {
                path: output.to_path_buf(),
                source: e,
            })?;
            return Ok(SanitizeStats::none());
        }

        tracing::debug!(strategy = strategy.name(), entries = set.len(), "sanitizing");
        strategy.sanitize(input, output, set)
    }

    /// Flattened text of `input`.
    pub fn extract_text(&self, input: &Path) -> SanitizerResult<String> {
        ensure_exists(input)?;
        self.strategy_for_path(input)?.extract_text(input)
    }
}

fn ensure_exists(input: &Path) -> SanitizerResult<()> {
    if input.exists() {
        return Ok(());
    }
    Err(SanitizerError::Io {
        path: input.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "Input file does not exist"),
    })
}
