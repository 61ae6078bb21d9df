//! In-memory fixed-layout model.
//!
//! Pages are lines of positioned glyphs with a fixed advance of half the
//! font size. Applied covers replace the glyphs under them with the
//! replacement text in the cover's style, so later searches see the edited
//! page.

use super::{CoverAndRedraw, GlyphSpan, PageSurface, PagedDocument, Rect, ScrubReport};
use crate::domain::StyleFlags;
use crate::error::{SanitizerError, SanitizerResult};

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphStyle {
    pub font: String,
    pub size: f32,
    pub color: u32,
    pub flags: StyleFlags,
}

impl GlyphStyle {
    pub fn new(font: &str, size: f32) -> Self {
        Self {
            font: font.to_string(),
            size,
            color: 0,
            flags: StyleFlags::default(),
        }
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.flags = flags;
        self
    }

    fn advance(&self) -> f32 {
        self.size * 0.5
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub style: GlyphStyle,
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    x: f32,
    y: f32,
    glyphs: Vec<Glyph>,
}

impl Line {
    fn height(&self) -> f32 {
        self.glyphs.iter().map(|g| g.style.size).fold(0.0, f32::max)
    }

    fn glyph_rects(&self) -> Vec<Rect> {
        let height = self.height();
        let mut x = self.x;
        self.glyphs
            .iter()
            .map(|g| {
                let rect = Rect::new(x, self.y, x + g.style.advance(), self.y + height);
                x = rect.x1;
                rect
            })
            .collect()
    }

    fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }

    /// Indices of the glyphs whose centers fall inside `rect`.
    fn glyphs_in(&self, rect: &Rect) -> Option<(usize, usize)> {
        let inside: Vec<usize> = self
            .glyph_rects()
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                let (cx, cy) = r.center();
                rect.contains_point(cx, cy)
            })
            .map(|(i, _)| i)
            .collect();
        Some((*inside.first()?, *inside.last()? + 1))
    }
}

fn same_char(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// A page held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPage {
    lines: Vec<Line>,
    pending: Vec<CoverAndRedraw>,
    covers: Vec<CoverAndRedraw>,
    reject_covers: bool,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line of uniformly styled text with its top-left at `(x, y)`.
    pub fn add_line(&mut self, x: f32, y: f32, text: &str, style: GlyphStyle) {
        self.add_styled_line(x, y, &[(text, style)]);
    }

    /// Adds a line made of differently styled pieces.
    pub fn add_styled_line(&mut self, x: f32, y: f32, pieces: &[(&str, GlyphStyle)]) {
        let glyphs = pieces
            .iter()
            .flat_map(|(text, style)| {
                text.chars().map(move |ch| Glyph {
                    ch,
                    style: style.clone(),
                })
            })
            .collect();
        self.lines.push(Line { x, y, glyphs });
    }

    /// Makes every subsequent `add_cover` fail.
    pub fn reject_covers(&mut self, reject: bool) {
        self.reject_covers = reject;
    }

    /// Current text, one line per row.
    pub fn text(&self) -> String {
        self.lines.iter().map(Line::text).collect::<Vec<_>>().join("\n")
    }

    /// Covers applied so far, in application order.
    pub fn covers(&self) -> &[CoverAndRedraw] {
        &self.covers
    }

    /// Glyphs of line `index`.
    pub fn glyphs(&self, index: usize) -> &[Glyph] {
        self.lines.get(index).map(|l| l.glyphs.as_slice()).unwrap_or(&[])
    }

    fn redraw_style(cover: &CoverAndRedraw) -> GlyphStyle {
        let mut flags = StyleFlags::default();
        let name = cover.style.font.base_name();
        if name.contains("Bold") {
            flags = flags.with(StyleFlags::BOLD);
        }
        if name.contains("Italic") || name.contains("Oblique") {
            flags = flags.with(StyleFlags::ITALIC);
        }
        if name.starts_with("Courier") {
            flags = flags.with(StyleFlags::MONOSPACE);
        }
        GlyphStyle {
            font: name.to_string(),
            size: cover.style.size,
            color: cover.style.color.to_packed(),
            flags,
        }
    }
}

impl PageSurface for MemoryPage {
    fn search(&mut self, needle: &str, max_hits: u32) -> SanitizerResult<Vec<Rect>> {
        let needle: Vec<char> = needle.chars().collect();
        let mut hits = Vec::new();
        if needle.is_empty() {
            return Ok(hits);
        }

        for line in &self.lines {
            let rects = line.glyph_rects();
            let mut i = 0;
            while i + needle.len() <= line.glyphs.len() {
                if hits.len() as u32 >= max_hits {
                    return Ok(hits);
                }
                let matched = line.glyphs[i..i + needle.len()]
                    .iter()
                    .zip(&needle)
                    .all(|(g, c)| same_char(g.ch, *c));
                if matched {
                    let rect = rects[i..i + needle.len()]
                        .iter()
                        .fold(rects[i], |acc, r| acc.union(r));
                    hits.push(rect);
                    i += needle.len();
                } else {
                    i += 1;
                }
            }
        }
        Ok(hits)
    }

    fn text_in(&mut self, rect: &Rect) -> SanitizerResult<String> {
        let mut out = String::new();
        for line in &self.lines {
            if let Some((start, end)) = line.glyphs_in(rect) {
                out.extend(line.glyphs[start..end].iter().map(|g| g.ch));
            }
        }
        Ok(out)
    }

    fn spans(&mut self) -> SanitizerResult<Vec<GlyphSpan>> {
        let mut spans: Vec<GlyphSpan> = Vec::new();
        for line in &self.lines {
            let mut current: Option<GlyphSpan> = None;
            for (glyph, rect) in line.glyphs.iter().zip(line.glyph_rects()) {
                let same_style = current.as_ref().is_some_and(|span| {
                    span.font == glyph.style.font
                        && span.size == glyph.style.size
                        && span.color == glyph.style.color
                        && span.flags == glyph.style.flags
                });
                if let (true, Some(span)) = (same_style, current.as_mut()) {
                    span.text.push(glyph.ch);
                    span.bbox = span.bbox.union(&rect);
                    continue;
                }
                spans.extend(current.take());
                current = Some(GlyphSpan {
                    text: glyph.ch.to_string(),
                    font: glyph.style.font.clone(),
                    size: glyph.style.size,
                    color: glyph.style.color,
                    flags: glyph.style.flags,
                    bbox: rect,
                });
            }
            spans.extend(current);
        }
        Ok(spans)
    }

    fn add_cover(&mut self, cover: &CoverAndRedraw) -> SanitizerResult<()> {
        if self.reject_covers {
            return Err(SanitizerError::PdfProcessing {
                message: "Page rejected redaction cover".to_string(),
                page: None,
                source: None,
            });
        }
        if cover.rect.is_empty() {
            return Err(SanitizerError::InvalidInput {
                parameter: "rect".to_string(),
                reason: "Cover rectangle has no area".to_string(),
            });
        }
        self.pending.push(cover.clone());
        Ok(())
    }

    fn apply_covers(&mut self) -> SanitizerResult<usize> {
        let pending = std::mem::take(&mut self.pending);

        // Resolve every cover against the unedited page first.
        let mut edits: Vec<(usize, usize, usize, GlyphStyle, &str)> = Vec::new();
        for cover in &pending {
            for (index, line) in self.lines.iter().enumerate() {
                if let Some((start, end)) = line.glyphs_in(&cover.rect) {
                    edits.push((index, start, end, Self::redraw_style(cover), &cover.text));
                }
            }
        }

        edits.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        for (index, start, end, style, text) in edits {
            let glyphs = text.chars().map(|ch| Glyph {
                ch,
                style: style.clone(),
            });
            self.lines[index].glyphs.splice(start..end, glyphs);
        }

        let applied = pending.len();
        self.covers.extend(pending);
        Ok(applied)
    }
}

/// Pages plus the document-level data the final scrub removes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
    metadata: Vec<(String, String)>,
    scripts: Vec<String>,
    attachments: Vec<String>,
    hidden_text: Vec<String>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_script(mut self, script: &str) -> Self {
        self.scripts.push(script.to_string());
        self
    }

    pub fn with_attachment(mut self, name: &str) -> Self {
        self.attachments.push(name.to_string());
        self
    }

    pub fn with_hidden_text(mut self, text: &str) -> Self {
        self.hidden_text.push(text.to_string());
        self
    }

    pub fn pages(&self) -> &[MemoryPage] {
        &self.pages
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// True if no metadata, scripts, attachments or hidden text remain.
    pub fn is_scrubbed(&self) -> bool {
        self.metadata.is_empty()
            && self.scripts.is_empty()
            && self.attachments.is_empty()
            && self.hidden_text.is_empty()
    }
}

impl PagedDocument for MemoryDocument {
    type Page<'a> = &'a mut MemoryPage;

    fn page_count(&self) -> SanitizerResult<usize> {
        Ok(self.pages.len())
    }

    fn page(&mut self, index: usize) -> SanitizerResult<&mut MemoryPage> {
        self.pages
            .get_mut(index)
            .ok_or_else(|| SanitizerError::PdfProcessing {
                message: "Page index out of range".to_string(),
                page: Some(index + 1),
                source: None,
            })
    }

    fn finalize(&mut self) -> SanitizerResult<ScrubReport> {
        let report = ScrubReport {
            metadata_removed: self.metadata.len(),
            scripts_removed: self.scripts.len(),
            attachments_removed: self.attachments.len(),
            thumbnails_removed: 0,
            hidden_text_removed: self.hidden_text.len(),
        };
        self.metadata.clear();
        self.scripts.clear();
        self.attachments.clear();
        self.hidden_text.clear();
        Ok(report)
    }
}
