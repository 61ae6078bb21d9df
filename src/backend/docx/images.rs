//! Replacement of inline pictures with bold text placeholders.

use super::paragraph::{set_run_text, RUN};
use super::xml::{XmlElement, XmlNode};

/// Which kind of part a picture was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Body,
    Header,
    Footer,
    Notes,
}

impl PartKind {
    pub fn from_part_name(name: &str) -> Self {
        let file = name.rsplit('/').next().unwrap_or(name);
        if file.starts_with("header") {
            Self::Header
        } else if file.starts_with("footer") {
            Self::Footer
        } else if file.starts_with("footnotes") || file.starts_with("endnotes") {
            Self::Notes
        } else {
            Self::Body
        }
    }
}

/// Pictures removed from one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOutcome {
    pub replaced: usize,
    /// Relationship ids the removed pictures referenced
    pub released: Vec<String>,
}

const DRAWING: &[u8] = b"w:drawing";
const PICT: &[u8] = b"w:pict";
const ALTERNATE: &[u8] = b"mc:AlternateContent";
const TEXT_BOX: &[u8] = b"w:txbxContent";

fn is_picture(el: &XmlElement) -> bool {
    if el.is(DRAWING) || el.is(PICT) {
        return !el.has_descendant(TEXT_BOX);
    }
    el.is(ALTERNATE)
        && (el.has_descendant(DRAWING) || el.has_descendant(PICT))
        && !el.has_descendant(TEXT_BOX)
}

fn referenced_ids(el: &XmlElement, out: &mut Vec<String>) {
    out.extend(el.attr_values_with_prefix(b"r:"));
    for child in el.elements() {
        referenced_ids(child, out);
    }
}

fn make_bold(run: &mut XmlElement) {
    let props = match run.children.iter().position(|n| {
        n.as_element().is_some_and(|el| el.is(b"w:rPr"))
    }) {
        Some(index) => index,
        None => {
            run.children.insert(0, XmlNode::Element(XmlElement::new("w:rPr")));
            0
        }
    };
    if let Some(props) = run.children[props].as_element_mut() {
        if !props.has_child(b"w:b") {
            props.children.insert(0, XmlNode::Element(XmlElement::new("w:b")));
        }
    }
}

/// Replaces every picture run in `nodes` with placeholder text.
///
/// Body pictures are numbered from `counter + 1`; the counter is advanced
/// so numbering continues across parts. Notes parts are left alone.
pub fn replace_pictures(nodes: &mut [XmlNode], kind: PartKind, counter: &mut usize) -> ImageOutcome {
    let mut outcome = ImageOutcome::default();
    if kind == PartKind::Notes {
        return outcome;
    }
    visit_runs(nodes, &mut |run| {
        if !run.elements().any(is_picture) {
            return;
        }
        let mut kept = Vec::with_capacity(run.children.len());
        for child in std::mem::take(&mut run.children) {
            match child {
                XmlNode::Element(el) if is_picture(&el) => referenced_ids(&el, &mut outcome.released),
                other => kept.push(other),
            }
        }
        run.children = kept;

        let placeholder = match kind {
            PartKind::Header => "[Header Image] ".to_string(),
            PartKind::Footer => "[Footer Image] ".to_string(),
            _ => {
                *counter += 1;
                format!("[Photo-{}] ", counter)
            }
        };
        make_bold(run);
        set_run_text(run, &placeholder);
        outcome.replaced += 1;
    });
    outcome
}

fn visit_runs(nodes: &mut [XmlNode], f: &mut dyn FnMut(&mut XmlElement)) {
    for node in nodes.iter_mut() {
        if let XmlNode::Element(el) = node {
            if el.is(RUN) {
                f(el);
            }
            visit_runs(&mut el.children, f);
        }
    }
}

/// True if any element in `nodes` still references relationship `id`.
pub fn still_referenced(nodes: &[XmlNode], id: &str) -> bool {
    nodes.iter().filter_map(XmlNode::as_element).any(|el| {
        el.attr_values_with_prefix(b"r:").iter().any(|v| v == id) || still_referenced(&el.children, id)
    })
}
