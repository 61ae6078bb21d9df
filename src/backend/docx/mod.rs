//! DOCX backend.
//!
//! Parses the text-bearing parts of a package, exposes every paragraph
//! (body, tables, text boxes, headers, footers, notes) to the flow engine
//! and writes the edited parts back with their relationships cleaned up.

pub mod images;
pub mod package;
pub mod paragraph;
pub mod xml;

pub use images::PartKind;
pub use package::DocxPackage;
pub use paragraph::{DocxFragment, DocxParagraph};

use crate::error::{SanitizerError, SanitizerResult};
use crate::flow::{ContainerOutcome, FlowEngine};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use xml::XmlNode;

struct Part {
    name: String,
    kind: PartKind,
    nodes: Vec<XmlNode>,
    dirty: bool,
    /// Relationship ids to drop from this part's rels
    released: BTreeSet<String>,
}

/// Totals for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxOutcome {
    pub containers_processed: usize,
    pub containers_changed: usize,
    pub replacements: usize,
    pub links_unwrapped: usize,
    pub degraded_rewrites: usize,
    pub limit_hits: usize,
    pub consumed: BTreeSet<usize>,
}

impl DocxOutcome {
    fn absorb(&mut self, outcome: ContainerOutcome) {
        self.containers_processed += 1;
        if outcome.changed() {
            self.containers_changed += 1;
        }
        self.replacements += outcome.replacements;
        self.links_unwrapped += outcome.links_unwrapped;
        self.degraded_rewrites += outcome.degraded_rewrites;
        self.limit_hits += outcome.limit_hits;
        self.consumed.extend(outcome.consumed);
    }
}

/// A DOCX package with its text parts parsed.
pub struct DocxDocument {
    package: DocxPackage,
    parts: Vec<Part>,
}

impl DocxDocument {
    pub fn open(path: &Path) -> SanitizerResult<Self> {
        Self::from_package(DocxPackage::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> SanitizerResult<Self> {
        Self::from_package(DocxPackage::from_bytes(bytes)?)
    }

    fn from_package(package: DocxPackage) -> SanitizerResult<Self> {
        let mut parts = Vec::new();
        for name in package.text_parts() {
            let Some(nodes) = package::parse_part(&package, &name)? else {
                continue;
            };
            if xml::root(&nodes).is_none() {
                return Err(SanitizerError::malformed("DOCX", format!("{} has no root element", name)));
            }
            parts.push(Part {
                kind: PartKind::from_part_name(&name),
                name,
                nodes,
                dirty: false,
                released: BTreeSet::new(),
            });
        }
        Ok(Self { package, parts })
    }

    /// Names of the parsed text parts, body first.
    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// One line per non-empty paragraph across every text part.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for part in &self.parts {
            xml::visit_elements(&part.nodes, paragraph::PARAGRAPH, &mut |p| {
                let text = paragraph::paragraph_text(p);
                if !text.trim().is_empty() {
                    lines.push(text);
                }
            });
        }
        lines.join("\n")
    }

    /// Replaces pictures with placeholders. Returns how many were replaced.
    pub fn replace_images(&mut self) -> usize {
        let mut counter = 0;
        let mut total = 0;
        for part in &mut self.parts {
            let outcome = images::replace_pictures(&mut part.nodes, part.kind, &mut counter);
            if outcome.replaced == 0 {
                continue;
            }
            part.dirty = true;
            total += outcome.replaced;
            for id in outcome.released {
                if !images::still_referenced(&part.nodes, &id) {
                    part.released.insert(id);
                }
            }
        }
        if total > 0 {
            tracing::info!(images = total, "replaced pictures with placeholders");
        }
        total
    }

    /// Runs the flow engine over every paragraph.
    pub fn sanitize(&mut self, engine: &FlowEngine<'_>) -> DocxOutcome {
        let mut totals = DocxOutcome::default();
        let mut per_part: BTreeMap<String, usize> = BTreeMap::new();

        for part in &mut self.parts {
            let mut part_changes = 0;
            let mut released = Vec::new();
            paragraph::for_each_paragraph(&mut part.nodes, &mut |element| {
                let mut container = DocxParagraph::new(element);
                let outcome = engine.sanitize_container(&mut container);
                if outcome.changed() {
                    part_changes += 1;
                }
                released.extend(outcome.discarded_targets.iter().cloned());
                totals.absorb(outcome);
            });

            if part_changes > 0 {
                part.dirty = true;
            }
            part.released
                .extend(released.into_iter().filter(|id| !images::still_referenced(&part.nodes, id)));
            per_part.insert(part.name.clone(), part_changes);
        }

        tracing::debug!(?per_part, "paragraphs changed per part");
        totals
    }

    /// Serializes edited parts, drops released relationships and
    /// unreferenced media, and returns the package bytes.
    pub fn to_bytes(&mut self) -> SanitizerResult<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    pub fn save(&mut self, path: &Path) -> SanitizerResult<()> {
        self.flush()?;
        self.package.save(path)
    }

    fn flush(&mut self) -> SanitizerResult<()> {
        let mut rels_removed = 0;
        for part in &mut self.parts {
            if part.dirty {
                self.package.set_part(&part.name, xml::write(&part.nodes)?);
                part.dirty = false;
            }
            rels_removed += self.package.remove_relationships(&part.name, &part.released)?;
            part.released.clear();
        }
        let media_removed = self.package.prune_unreferenced_media()?;
        tracing::debug!(rels_removed, media_removed, "cleaned package relationships");
        Ok(())
    }
}
