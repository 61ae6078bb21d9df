//! Fixed-layout page redaction.
//!
//! A page exposes a case-insensitive rendered-text search, a glyph span
//! index and a destructive cover operation. The [`PageRedactionEngine`]
//! drives those per replacement entry and applies each entry's covers before
//! searching for the next one.

pub mod engine;
pub mod memory;

pub use engine::{PageOutcome, PageRedactionEngine};
pub use memory::{Glyph, GlyphStyle, MemoryDocument, MemoryPage};

use crate::domain::{StandardFont, StyleFlags};
use crate::error::SanitizerResult;
use serde::Serialize;

/// Axis-aligned rectangle in page space, y growing downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.area() <= 0.0
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!r.is_empty()).then_some(r)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}

/// Color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };

    /// Converts a packed `0xRRGGBB` value.
    pub fn from_packed(color: u32) -> Self {
        let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }

    pub fn to_packed(self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

/// A run of rendered glyphs sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSpan {
    pub text: String,
    pub font: String,
    pub size: f32,
    /// Packed `0xRRGGBB`
    pub color: u32,
    pub flags: StyleFlags,
    pub bbox: Rect,
}

/// Style used to redraw replacement text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f32,
    pub color: Rgb,
    /// Name of the page font the style was derived from
    pub source_font: Option<String>,
}

impl TextStyle {
    pub fn fallback(size: f32) -> Self {
        Self {
            font: StandardFont::Helvetica,
            size,
            color: Rgb::BLACK,
            source_font: None,
        }
    }

    pub fn from_span(span: &GlyphSpan) -> Self {
        Self {
            font: StandardFont::match_font(&span.font, span.flags),
            size: span.size,
            color: Rgb::from_packed(span.color),
            source_font: Some(span.font.clone()),
        }
    }
}

/// Style of the span with the largest overlap with `rect`.
pub fn style_at(spans: &[GlyphSpan], rect: &Rect, fallback_size: f32) -> TextStyle {
    spans
        .iter()
        .filter_map(|span| span.bbox.intersect(rect).map(|i| (i.area(), span)))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, span)| TextStyle::from_span(span))
        .unwrap_or_else(|| TextStyle::fallback(fallback_size))
}

/// Opaque white cover over `rect` with `text` redrawn left-aligned on top.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverAndRedraw {
    pub rect: Rect,
    pub text: String,
    pub style: TextStyle,
    pub fill: Rgb,
}

impl CoverAndRedraw {
    pub fn new(rect: Rect, text: &str, style: TextStyle) -> Self {
        Self {
            rect,
            text: text.to_string(),
            style,
            fill: Rgb::WHITE,
        }
    }
}

/// What the document-level scrub removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrubReport {
    pub metadata_removed: usize,
    pub scripts_removed: usize,
    pub attachments_removed: usize,
    pub thumbnails_removed: usize,
    pub hidden_text_removed: usize,
}

impl ScrubReport {
    pub fn total(&self) -> usize {
        self.metadata_removed
            + self.scripts_removed
            + self.attachments_removed
            + self.thumbnails_removed
            + self.hidden_text_removed
    }
}

/// One fixed-layout page.
pub trait PageSurface {
    /// Case-insensitive literal search of the current rendered text.
    fn search(&mut self, needle: &str, max_hits: u32) -> SanitizerResult<Vec<Rect>>;

    /// Rendered text whose glyphs fall inside `rect`.
    fn text_in(&mut self, rect: &Rect) -> SanitizerResult<String>;

    /// Glyph span index of the current page state.
    fn spans(&mut self) -> SanitizerResult<Vec<GlyphSpan>>;

    /// Registers a cover. Nothing changes until [`PageSurface::apply_covers`].
    fn add_cover(&mut self, cover: &CoverAndRedraw) -> SanitizerResult<()>;

    /// Applies every registered cover. Returns how many were applied.
    fn apply_covers(&mut self) -> SanitizerResult<usize>;
}

impl<T: PageSurface + ?Sized> PageSurface for &mut T {
    fn search(&mut self, needle: &str, max_hits: u32) -> SanitizerResult<Vec<Rect>> {
        (**self).search(needle, max_hits)
    }

    fn text_in(&mut self, rect: &Rect) -> SanitizerResult<String> {
        (**self).text_in(rect)
    }

    fn spans(&mut self) -> SanitizerResult<Vec<GlyphSpan>> {
        (**self).spans()
    }

    fn add_cover(&mut self, cover: &CoverAndRedraw) -> SanitizerResult<()> {
        (**self).add_cover(cover)
    }

    fn apply_covers(&mut self) -> SanitizerResult<usize> {
        (**self).apply_covers()
    }
}

/// A document made of fixed-layout pages.
pub trait PagedDocument {
    type Page<'a>: PageSurface
    where
        Self: 'a;

    fn page_count(&self) -> SanitizerResult<usize>;

    /// Loads page `index` (zero-based).
    fn page(&mut self, index: usize) -> SanitizerResult<Self::Page<'_>>;

    /// Strips metadata, scripts, attachments and hidden text once every page
    /// has been processed.
    fn finalize(&mut self) -> SanitizerResult<ScrubReport>;
}
