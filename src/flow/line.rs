//! In-memory rich-text line.

use super::{FlowContainer, TextFragment};

/// Opaque style reference carried by a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleHandle(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub style: StyleHandle,
}

impl Fragment {
    pub fn new(text: &str, style: StyleHandle) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }
}

impl TextFragment for Fragment {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

/// A child of a [`StyledLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain direct fragment
    Fragment(Fragment),
    /// Fragments wrapped in a hyperlink
    Link {
        target: String,
        fragments: Vec<Fragment>,
    },
    /// Text nested in a wrapper the fragment enumeration does not see
    Embedded(Fragment),
}

impl Inline {
    fn visible_text(&self, out: &mut String) {
        match self {
            Inline::Fragment(f) | Inline::Embedded(f) => out.push_str(&f.text),
            Inline::Link { fragments, .. } => {
                fragments.iter().for_each(|f| out.push_str(&f.text));
            }
        }
    }
}

/// A line of text made of independently styled fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    items: Vec<Inline>,
}

impl StyledLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// One direct fragment per text, styles numbered from zero.
    pub fn from_texts(texts: &[&str]) -> Self {
        let mut line = Self::new();
        for (i, text) in texts.iter().enumerate() {
            line.push_fragment(text, StyleHandle(i as u32));
        }
        line
    }

    pub fn push_fragment(&mut self, text: &str, style: StyleHandle) {
        self.items.push(Inline::Fragment(Fragment::new(text, style)));
    }

    pub fn push_link(&mut self, target: &str, fragments: Vec<Fragment>) {
        self.items.push(Inline::Link {
            target: target.to_string(),
            fragments,
        });
    }

    pub fn push_embedded(&mut self, text: &str, style: StyleHandle) {
        self.items.push(Inline::Embedded(Fragment::new(text, style)));
    }

    pub fn items(&self) -> &[Inline] {
        &self.items
    }

    /// Visible text of every child, in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.items.iter().for_each(|i| i.visible_text(&mut out));
        out
    }

    /// Styles of the direct fragments, in order.
    pub fn styles(&self) -> Vec<StyleHandle> {
        self.items
            .iter()
            .filter_map(|i| match i {
                Inline::Fragment(f) => Some(f.style),
                _ => None,
            })
            .collect()
    }
}

impl FlowContainer for StyledLine {
    type Fragment<'a> = &'a mut Fragment;

    fn unwrap_links(&mut self) -> Vec<String> {
        if !self.items.iter().any(|i| matches!(i, Inline::Link { .. })) {
            return Vec::new();
        }

        let mut targets = Vec::new();
        let mut items = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            match item {
                Inline::Link { target, fragments } => {
                    targets.push(target);
                    items.extend(fragments.into_iter().map(Inline::Fragment));
                }
                other => items.push(other),
            }
        }
        self.items = items;
        targets
    }

    fn fragments(&mut self) -> Vec<&mut Fragment> {
        self.items
            .iter_mut()
            .filter_map(|i| match i {
                Inline::Fragment(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    fn loose_fragments(&mut self) -> Vec<&mut Fragment> {
        self.items
            .iter_mut()
            .filter_map(|i| match i {
                Inline::Embedded(f) => Some(f),
                _ => None,
            })
            .collect()
    }
}
