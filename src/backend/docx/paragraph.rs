//! WordprocessingML paragraphs as flowing containers.
//!
//! Fragments are the paragraph's direct `w:r` runs. A run's text is the
//! concatenation of its direct `w:t` children, with `w:tab` read as a tab
//! and `w:br`/`w:cr` as a line break. Rewriting leaves `w:rPr` untouched.
//! Text nested under revision marks, smart tags, fields or content controls
//! is exposed as loose text nodes for the degraded pass.

use super::xml::{XmlElement, XmlNode};
use crate::flow::{FlowContainer, TextFragment};

pub const PARAGRAPH: &[u8] = b"w:p";
pub const RUN: &[u8] = b"w:r";
pub const TEXT: &[u8] = b"w:t";
pub const DELETED_TEXT: &[u8] = b"w:delText";
pub const HYPERLINK: &[u8] = b"w:hyperlink";
pub const PARAGRAPH_PROPS: &[u8] = b"w:pPr";

pub const TAB: &[u8] = b"w:tab";
pub const BREAK: &[u8] = b"w:br";
pub const CARRIAGE_RETURN: &[u8] = b"w:cr";

/// Character a run-level tab or break element reads as.
pub fn separator_char(el: &XmlElement) -> Option<char> {
    if el.is(TAB) {
        Some('\t')
    } else if el.is(BREAK) || el.is(CARRIAGE_RETURN) {
        Some('\n')
    } else {
        None
    }
}

fn is_separator(c: char) -> bool {
    c == '\t' || c == '\n'
}

/// Direct text of a run, with tabs and breaks as `\t` and `\n`.
pub fn run_text(run: &XmlElement) -> String {
    let mut out = String::new();
    for el in run.elements() {
        if el.is(TEXT) {
            out.push_str(&el.text());
        } else if let Some(c) = separator_char(el) {
            out.push(c);
        }
    }
    out
}

fn set_text_node(node: &mut XmlElement, text: &str) {
    node.set_text(text);
    node.set_attr("xml:space", "preserve");
}

fn text_node(text: &str) -> XmlNode {
    let mut node = XmlElement::new("w:t");
    set_text_node(&mut node, text);
    XmlNode::Element(node)
}

/// Rewrites a run's text, keeping its properties.
///
/// When the new text carries the same tabs and breaks as the run, each
/// segment goes into the first `w:t` between its separators and the
/// separator elements stay in place. Otherwise the run's text and
/// separator elements are rebuilt from the new text.
pub fn set_run_text(run: &mut XmlElement, text: &str) {
    let existing: Vec<char> = run.elements().filter_map(separator_char).collect();
    let wanted: Vec<char> = text.chars().filter(|c| is_separator(*c)).collect();
    if existing == wanted {
        let segments: Vec<&str> = text.split(is_separator).collect();
        write_segments(run, &segments);
    } else {
        rebuild_text(run, text);
    }
}

fn write_segments(run: &mut XmlElement, segments: &[&str]) {
    let mut insertions: Vec<(usize, &str)> = Vec::new();
    let mut group = 0;
    let mut written = false;

    for (index, child) in run.children.iter_mut().enumerate() {
        let Some(el) = child.as_element_mut() else {
            continue;
        };
        if el.is(TEXT) {
            if written {
                el.children.clear();
            } else {
                set_text_node(el, segments[group]);
                written = true;
            }
        } else if separator_char(el).is_some() {
            if !written && !segments[group].is_empty() {
                insertions.push((index, segments[group]));
            }
            group += 1;
            written = false;
        }
    }
    if !written && !segments[group].is_empty() {
        insertions.push((run.children.len(), segments[group]));
    }

    for (index, segment) in insertions.into_iter().rev() {
        run.children.insert(index, text_node(segment));
        run.empty = false;
    }
}

fn rebuild_text(run: &mut XmlElement, text: &str) {
    let is_text_item =
        |node: &XmlNode| node.as_element().is_some_and(|el| el.is(TEXT) || separator_char(el).is_some());

    let position = run
        .children
        .iter()
        .take_while(|node| !is_text_item(*node))
        .count();
    run.children.retain(|node| !is_text_item(node));

    let mut nodes = Vec::new();
    let mut segment = String::new();
    for c in text.chars() {
        if !is_separator(c) {
            segment.push(c);
            continue;
        }
        if !segment.is_empty() {
            nodes.push(text_node(&segment));
            segment.clear();
        }
        let name = if c == '\t' { "w:tab" } else { "w:br" };
        nodes.push(XmlNode::Element(XmlElement::new(name)));
    }
    if !segment.is_empty() {
        nodes.push(text_node(&segment));
    }

    if !nodes.is_empty() {
        run.empty = false;
    }
    run.children.splice(position..position, nodes);
}

/// Visible text of a paragraph, excluding nested paragraphs and paragraph
/// properties (whose `w:tabs` hold tab stops, not tabs).
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    fn collect(el: &XmlElement, out: &mut String) {
        for child in el.elements() {
            if child.is(PARAGRAPH) || child.is(PARAGRAPH_PROPS) {
                continue;
            }
            if child.is(TEXT) || child.is(DELETED_TEXT) {
                out.push_str(&child.text());
            } else if let Some(c) = separator_char(child) {
                out.push(c);
            } else {
                collect(child, out);
            }
        }
    }
    let mut out = String::new();
    collect(paragraph, &mut out);
    out
}

/// Calls `f` for every paragraph, outer paragraphs before the text-box
/// paragraphs nested inside them.
pub fn for_each_paragraph(nodes: &mut [XmlNode], f: &mut dyn FnMut(&mut XmlElement)) {
    super::xml::for_each_element(nodes, PARAGRAPH, f);
}

pub enum DocxFragment<'a> {
    Run(&'a mut XmlElement),
    Text(&'a mut XmlElement),
}

impl TextFragment for DocxFragment<'_> {
    fn text(&self) -> String {
        match self {
            DocxFragment::Run(run) => run_text(run),
            DocxFragment::Text(node) => node.text(),
        }
    }

    fn set_text(&mut self, text: &str) {
        match self {
            DocxFragment::Run(run) => set_run_text(run, text),
            DocxFragment::Text(node) => set_text_node(node, text),
        }
    }
}

/// A `w:p` element borrowed for one sanitize pass.
pub struct DocxParagraph<'p> {
    element: &'p mut XmlElement,
}

impl<'p> DocxParagraph<'p> {
    pub fn new(element: &'p mut XmlElement) -> Self {
        Self { element }
    }
}

fn collect_loose<'a>(el: &'a mut XmlElement, out: &mut Vec<DocxFragment<'a>>) {
    for child in el.elements_mut() {
        if child.is(TEXT) || child.is(DELETED_TEXT) {
            out.push(DocxFragment::Text(child));
        } else if !child.is(PARAGRAPH) {
            collect_loose(child, out);
        }
    }
}

impl<'p> FlowContainer for DocxParagraph<'p> {
    type Fragment<'a> = DocxFragment<'a> where Self: 'a;

    /// Returns the relationship ids of the removed hyperlinks.
    fn unwrap_links(&mut self) -> Vec<String> {
        if !self.element.has_child(HYPERLINK) {
            return Vec::new();
        }

        let mut rel_ids = Vec::new();
        let children = std::mem::take(&mut self.element.children);
        for child in children {
            match child {
                XmlNode::Element(link) if link.is(HYPERLINK) => {
                    if let Some(id) = link.attr(b"r:id") {
                        rel_ids.push(id);
                    }
                    self.element.children.extend(link.children);
                }
                other => self.element.children.push(other),
            }
        }
        rel_ids
    }

    fn fragments(&mut self) -> Vec<DocxFragment<'_>> {
        self.element
            .elements_mut()
            .filter(|el| el.is(RUN))
            .map(DocxFragment::Run)
            .collect()
    }

    fn loose_fragments(&mut self) -> Vec<DocxFragment<'_>> {
        let mut out = Vec::new();
        for child in self.element.elements_mut() {
            if child.is(RUN) || child.is(PARAGRAPH_PROPS) {
                continue;
            }
            collect_loose(child, &mut out);
        }
        out
    }
}
