//! PII sanitizer CLI.
//!
//! Thin developer front end for the sanitizer library: replacement lists are
//! supplied as JSON files in the detector's candidate format.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pii_sanitizer::{EngineConfig, ReplacementCandidate, SanitizeService, SanitizeStats};

/// PII Sanitizer
///
/// Replaces personal data in DOCX and PDF documents with placeholders while
/// keeping the layout. By default, performs sanitization. Use the 'extract'
/// and 'plan' subcommands for inspection.
#[derive(Parser)]
#[command(name = "pii-sanitizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input document (.docx or .pdf)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output document path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON array of {original, type, replacement} records
    #[arg(short, long, value_name = "FILE")]
    replacements: Option<PathBuf>,

    /// Do not scan the document for uncovered emails, phones and IDs
    #[arg(long)]
    no_safety_net: bool,

    /// Keep DOCX pictures instead of replacing them with placeholders
    #[arg(long)]
    no_image_placeholders: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the flattened document text (for debugging and verification)
    Extract {
        /// Input document path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the final replacement set, safety net included, as JSON
    Plan {
        /// Input document path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// JSON array of replacement records (optional)
        #[arg(short, long, value_name = "FILE")]
        replacements: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Builds the engine configuration from the config file and CLI switches.
fn build_config(path: Option<&Path>, no_safety_net: bool, no_image_placeholders: bool) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if no_safety_net {
        config = config.with_safety_net(false);
    }
    if no_image_placeholders {
        config = config.with_image_placeholders(false);
    }
    Ok(config)
}

fn load_candidates(path: Option<&Path>) -> Result<Vec<ReplacementCandidate>> {
    match path {
        Some(path) => SanitizeService::load_candidates(path)
            .with_context(|| format!("Failed to read replacements from {}", path.display())),
        None => Ok(Vec::new()),
    }
}

/// Command handler owning the configured service.
struct SanitizeHandler {
    service: SanitizeService,
    verbose: bool,
}

impl SanitizeHandler {
    fn new(config: EngineConfig, verbose: bool) -> Result<Self> {
        let service = SanitizeService::new(config).context("Invalid engine configuration")?;
        Ok(Self { service, verbose })
    }

    fn sanitize(&self, input: &Path, output: &Path, candidates: &[ReplacementCandidate]) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        if self.verbose {
            println!("Input:  {}", input.display());
            println!("Output: {}", output.display());
            println!("Candidates: {}", candidates.len());
        }

        let stats = self
            .service
            .sanitize(input, output, candidates)
            .with_context(|| "Sanitization failed")?;

        if self.verbose {
            print_summary(&stats);
        }

        if stats.has_replacements() {
            println!(
                "✓ Replaced {} occurrence(s) → {}",
                stats.replacements_applied,
                output.display()
            );
        } else {
            println!("⚠ No occurrences found to replace");
        }
        Ok(())
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let text = self
            .service
            .extract_text(input)
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }
        Ok(())
    }

    fn plan(&self, input: &Path, candidates: &[ReplacementCandidate]) -> Result<()> {
        let plan = self
            .service
            .plan(input, candidates)
            .with_context(|| "Planning failed")?;
        let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{}", json);
        Ok(())
    }
}

fn print_summary(stats: &SanitizeStats) {
    println!("\nSanitize Summary:");
    println!("  Containers processed: {}", stats.containers_processed);
    println!("  Containers changed:   {}", stats.containers_changed);
    println!("  Replacements:         {}", stats.replacements_applied);
    println!(
        "  Entries matched:      {}/{}",
        stats.entries_consumed, stats.entries_total
    );
    println!("  Safety net added:     {}", stats.safety_net_added);
    if stats.links_unwrapped > 0 || stats.images_replaced > 0 {
        println!("  Links unwrapped:      {}", stats.links_unwrapped);
        println!("  Images replaced:      {}", stats.images_replaced);
    }
    if stats.degraded_rewrites > 0 || stats.iteration_limit_hits > 0 || stats.rects_skipped > 0 {
        println!("  Degraded rewrites:    {}", stats.degraded_rewrites);
        println!("  Iteration limit hits: {}", stats.iteration_limit_hits);
        println!("  Rectangles skipped:   {}", stats.rects_skipped);
    }
    if stats.scrub.total() > 0 {
        println!("  Scrubbed objects:     {}", stats.scrub.total());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(cli.config.as_deref(), cli.no_safety_net, cli.no_image_placeholders)?;
    let handler = SanitizeHandler::new(config, cli.verbose)?;

    match &cli.command {
        Some(Commands::Extract { input, output }) => {
            handler.extract(input, output.as_deref())?;
        }
        Some(Commands::Plan { input, replacements }) => {
            let candidates = load_candidates(replacements.as_deref())?;
            handler.plan(input, &candidates)?;
        }
        None => {
            let input = cli
                .input
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            let output = cli
                .output
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--output is required"))?;
            let replacements = cli
                .replacements
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--replacements is required"))?;

            let candidates = load_candidates(Some(replacements))?;
            handler.sanitize(input, output, &candidates)?;
        }
    }

    Ok(())
}
