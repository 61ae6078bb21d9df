//! Owned XML tree over quick-xml events.
//!
//! WordprocessingML parts are small enough to hold in memory. The tree keeps
//! every event it does not interpret (declarations, comments, CDATA) so a
//! part round-trips unchanged apart from the edits made to it.

use crate::error::{SanitizerError, SanitizerResult};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    Other(Event<'static>),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub start: BytesStart<'static>,
    pub children: Vec<XmlNode>,
    /// Written as `<x/>` while it has no children
    pub empty: bool,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            empty: true,
        }
    }

    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    pub fn is(&self, name: &[u8]) -> bool {
        self.name() == name
    }

    pub fn attr(&self, key: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == key)
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Values of every attribute whose key starts with `prefix`.
    pub fn attr_values_with_prefix(&self, prefix: &[u8]) -> Vec<String> {
        self.start
            .attributes()
            .flatten()
            .filter(|a| a.key.as_ref().starts_with(prefix))
            .filter_map(|a| a.unescape_value().ok().map(|v| v.into_owned()))
            .collect()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        let key = key.as_bytes();
        let kept: Vec<(Vec<u8>, Vec<u8>)> = self
            .start
            .attributes()
            .flatten()
            .filter(|a| a.key.as_ref() != key)
            .map(|a| (a.key.as_ref().to_vec(), a.value.to_vec()))
            .collect();
        let name = String::from_utf8_lossy(self.name()).into_owned();

        let mut start = BytesStart::new(name);
        for (k, v) in &kept {
            start.push_attribute((k.as_slice(), v.as_slice()));
        }
        start.push_attribute((String::from_utf8_lossy(key).as_ref(), value));
        self.start = start;
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    pub fn child(&self, name: &[u8]) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(name))
    }

    pub fn has_child(&self, name: &[u8]) -> bool {
        self.child(name).is_some()
    }

    /// True if any descendant element is named `name`.
    pub fn has_descendant(&self, name: &[u8]) -> bool {
        self.elements()
            .any(|el| el.is(name) || el.has_descendant(name))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces the children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![XmlNode::Text(text.to_string())];
    }
}

fn read_error(e: impl Display) -> SanitizerError {
    SanitizerError::malformed("XML", e.to_string())
}

fn write_error(e: impl Display) -> SanitizerError {
    SanitizerError::backend("quick-xml", format!("Failed to write XML: {}", e))
}

/// Parses an XML part into its top-level nodes.
pub fn parse(bytes: &[u8]) -> SanitizerResult<Vec<XmlNode>> {
    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut roots: Vec<XmlNode> = Vec::new();

    fn push(stack: &mut [XmlElement], roots: &mut Vec<XmlNode>, node: XmlNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    loop {
        match reader.read_event().map_err(read_error)? {
            Event::Start(start) => stack.push(XmlElement {
                start: start.into_owned(),
                children: Vec::new(),
                empty: false,
            }),
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| read_error("unexpected closing tag"))?;
                push(&mut stack, &mut roots, XmlNode::Element(el));
            }
            Event::Empty(start) => push(
                &mut stack,
                &mut roots,
                XmlNode::Element(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                    empty: true,
                }),
            ),
            Event::Text(text) => {
                let text = text.unescape().map_err(read_error)?.into_owned();
                push(&mut stack, &mut roots, XmlNode::Text(text));
            }
            Event::Eof => break,
            other => push(&mut stack, &mut roots, XmlNode::Other(other.into_owned())),
        }
    }

    if !stack.is_empty() {
        return Err(read_error("unclosed element at end of part"));
    }
    Ok(roots)
}

/// Serializes nodes back to bytes.
pub fn write(nodes: &[XmlNode]) -> SanitizerResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    write_nodes(&mut writer, nodes)?;
    Ok(writer.into_inner())
}

fn write_nodes(writer: &mut Writer<Vec<u8>>, nodes: &[XmlNode]) -> SanitizerResult<()> {
    for node in nodes {
        match node {
            XmlNode::Element(el) if el.empty && el.children.is_empty() => writer
                .write_event(Event::Empty(el.start.borrow()))
                .map_err(write_error)?,
            XmlNode::Element(el) => {
                writer
                    .write_event(Event::Start(el.start.borrow()))
                    .map_err(write_error)?;
                write_nodes(writer, &el.children)?;
                writer
                    .write_event(Event::End(el.start.to_end()))
                    .map_err(write_error)?;
            }
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
                .map_err(write_error)?,
            XmlNode::Other(event) => writer.write_event(event.borrow()).map_err(write_error)?,
        }
    }
    Ok(())
}

/// Finds the first top-level element.
pub fn root_mut(nodes: &mut [XmlNode]) -> Option<&mut XmlElement> {
    nodes.iter_mut().find_map(XmlNode::as_element_mut)
}

pub fn root(nodes: &[XmlNode]) -> Option<&XmlElement> {
    nodes.iter().find_map(XmlNode::as_element)
}

/// Calls `f` for every element named `name`, outermost first, then descends
/// into its children.
pub fn for_each_element(nodes: &mut [XmlNode], name: &[u8], f: &mut dyn FnMut(&mut XmlElement)) {
    for node in nodes.iter_mut() {
        if let XmlNode::Element(el) = node {
            if el.is(name) {
                f(el);
            }
            for_each_element(&mut el.children, name, f);
        }
    }
}

/// Same as [`for_each_element`] without mutation.
pub fn visit_elements(nodes: &[XmlNode], name: &[u8], f: &mut dyn FnMut(&XmlElement)) {
    for node in nodes {
        if let XmlNode::Element(el) = node {
            if el.is(name) {
                f(el);
            }
            visit_elements(&el.children, name, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PART: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve">A &amp; B </w:t></w:r><w:r><w:br/></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn test_round_trip_preserves_part() {
        let nodes = parse(PART.as_bytes()).unwrap();
        let written = String::from_utf8(write(&nodes).unwrap()).unwrap();
        assert_eq!(written, PART);
    }

    #[test]
    fn test_text_is_unescaped() {
        let nodes = parse(PART.as_bytes()).unwrap();
        let mut texts = Vec::new();
        visit_elements(&nodes, b"w:t", &mut |el| texts.push(el.text()));
        assert_eq!(texts, vec!["A & B ".to_string()]);
    }

    #[test]
    fn test_attribute_edit() {
        let mut el = XmlElement::new("w:hyperlink");
        el.set_attr("r:id", "rId5");
        el.set_attr("w:history", "1");
        assert_eq!(el.attr(b"r:id").as_deref(), Some("rId5"));
        el.set_attr("r:id", "rId7");
        assert_eq!(el.attr(b"r:id").as_deref(), Some("rId7"));
        assert_eq!(el.attr(b"w:history").as_deref(), Some("1"));
        assert_eq!(el.start.attributes().count(), 2);
    }

    #[test]
    fn test_unbalanced_part_rejected() {
        assert!(parse(b"<a><b></a>").is_err());
    }
}
