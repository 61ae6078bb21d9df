//! MuPDF-backed pages.
//!
//! MuPDF provides the rendered-text search, the structured text used for
//! glyph spans and clipped text, and the destructive redaction that removes
//! the original glyphs. Replacement text is drawn afterwards by
//! [`super::finish`], which also scrubs the saved file.

use super::{ffi, finish};
use crate::error::{SanitizerError, SanitizerResult};
use crate::page::{CoverAndRedraw, GlyphSpan, PageSurface, PagedDocument, Rect, ScrubReport};
use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::{Page, Quad, Rect as MuRect, TextPage, TextPageOptions};
use std::path::{Path, PathBuf};

fn path_str<'a>(path: &'a Path, parameter: &str) -> SanitizerResult<&'a str> {
    path.to_str().ok_or_else(|| SanitizerError::InvalidInput {
        parameter: parameter.to_string(),
        reason: "Path contains invalid UTF-8".to_string(),
    })
}

fn backend_error(message: String, e: mupdf::Error) -> SanitizerError {
    SanitizerError::BackendError {
        backend: "MuPDF".to_string(),
        message,
        source: Some(Box::new(e)),
    }
}

fn quad_bounds(quad: &Quad) -> Rect {
    Rect::new(
        quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
        quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
        quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
        quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
    )
}

/// A PDF opened with MuPDF, written to `output` on finalize.
pub struct MupdfDocument {
    doc: PdfDocument,
    output: PathBuf,
    page_count: usize,
    /// Applied covers per page, redrawn on finalize
    redraws: Vec<Vec<CoverAndRedraw>>,
}

impl MupdfDocument {
    pub fn open(input: &Path, output: &Path) -> SanitizerResult<Self> {
        let doc = PdfDocument::open(path_str(input, "input")?).map_err(|e| {
            SanitizerError::PdfProcessing {
                message: "Failed to open PDF with MuPDF".to_string(),
                page: None,
                source: Some(Box::new(e)),
            }
        })?;

        let page_count = doc
            .page_count()
            .map_err(|e| backend_error("Failed to get page count".to_string(), e))?;
        let page_count = usize::try_from(page_count).unwrap_or(0);

        Ok(Self {
            doc,
            output: output.to_path_buf(),
            page_count,
            redraws: vec![Vec::new(); page_count],
        })
    }

    /// Covers applied so far on page `index`.
    pub fn redraws(&self, index: usize) -> &[CoverAndRedraw] {
        self.redraws.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl PagedDocument for MupdfDocument {
    type Page<'a> = MupdfPage<'a>;

    fn page_count(&self) -> SanitizerResult<usize> {
        Ok(self.page_count)
    }

    fn page(&mut self, index: usize) -> SanitizerResult<MupdfPage<'_>> {
        let number = index + 1;
        let page = self
            .doc
            .load_page(index as i32)
            .map_err(|e| SanitizerError::PdfProcessing {
                message: format!("Failed to load page {}", number),
                page: Some(number),
                source: Some(Box::new(e)),
            })?;
        let pdf_page = PdfPage::try_from(page.clone()).map_err(|e| SanitizerError::PdfProcessing {
            message: "Page is not a PDF page".to_string(),
            page: Some(number),
            source: Some(Box::new(e)),
        })?;
        let redraws = self
            .redraws
            .get_mut(index)
            .ok_or_else(|| SanitizerError::PdfProcessing {
                message: "Page index out of range".to_string(),
                page: Some(number),
                source: None,
            })?;

        Ok(MupdfPage {
            number,
            page,
            pdf_page,
            pending: Vec::new(),
            redraws,
        })
    }

    fn finalize(&mut self) -> SanitizerResult<ScrubReport> {
        let output = path_str(&self.output, "output")?;
        self.doc.save(output).map_err(|e| SanitizerError::PdfProcessing {
            message: "Failed to save redacted PDF".to_string(),
            page: None,
            source: Some(Box::new(e)),
        })?;
        finish::finish(&self.output, &self.redraws)
    }
}

/// One loaded page. Covers registered here become MuPDF redaction
/// annotations; applying them removes the glyphs underneath.
pub struct MupdfPage<'a> {
    number: usize,
    page: Page,
    pdf_page: PdfPage,
    pending: Vec<CoverAndRedraw>,
    redraws: &'a mut Vec<CoverAndRedraw>,
}

impl MupdfPage<'_> {
    fn text_page(&self) -> SanitizerResult<TextPage> {
        self.page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| SanitizerError::PdfProcessing {
                message: "Failed to build structured text".to_string(),
                page: Some(self.number),
                source: Some(Box::new(e)),
            })
    }
}

impl PageSurface for MupdfPage<'_> {
    fn search(&mut self, needle: &str, max_hits: u32) -> SanitizerResult<Vec<Rect>> {
        let hits = self
            .page
            .search(needle, max_hits)
            .map_err(|e| backend_error(format!("Search failed on page {}", self.number), e))?;
        Ok(hits.iter().map(quad_bounds).collect())
    }

    fn text_in(&mut self, rect: &Rect) -> SanitizerResult<String> {
        let text_page = self.text_page()?;
        let mut out = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                for ch in line.chars() {
                    let (cx, cy) = quad_bounds(&ch.quad()).center();
                    if let (Some(c), true) = (ch.char(), rect.contains_point(cx, cy)) {
                        out.push(c);
                    }
                }
            }
        }
        Ok(out)
    }

    fn spans(&mut self) -> SanitizerResult<Vec<GlyphSpan>> {
        let text_page = self.text_page()?;
        let mut spans: Vec<GlyphSpan> = Vec::new();

        for block in text_page.blocks() {
            for line in block.lines() {
                let mut current: Option<GlyphSpan> = None;
                for ch in line.chars() {
                    let Some(c) = ch.char() else {
                        continue;
                    };
                    // SAFETY: `ch` borrows from `text_page`, which outlives this call.
                    let style = unsafe { ffi::char_style(&ch) }.unwrap_or_default();
                    let bbox = quad_bounds(&ch.quad());
                    let size = ch.size();

                    let same_style = current.as_ref().is_some_and(|span| {
                        span.font == style.font
                            && span.size == size
                            && span.color == style.color
                            && span.flags == style.flags
                    });
                    if let (true, Some(span)) = (same_style, current.as_mut()) {
                        span.text.push(c);
                        span.bbox = span.bbox.union(&bbox);
                        continue;
                    }
                    spans.extend(current.take());
                    current = Some(GlyphSpan {
                        text: c.to_string(),
                        font: style.font,
                        size,
                        color: style.color,
                        flags: style.flags,
                        bbox,
                    });
                }
                spans.extend(current);
            }
        }
        Ok(spans)
    }

    fn add_cover(&mut self, cover: &CoverAndRedraw) -> SanitizerResult<()> {
        let annot = self
            .pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| SanitizerError::PdfProcessing {
                message: "Failed to create redaction annotation".to_string(),
                page: Some(self.number),
                source: Some(Box::new(e)),
            })?;

        let rect = MuRect {
            x0: cover.rect.x0,
            y0: cover.rect.y0,
            x1: cover.rect.x1,
            y1: cover.rect.y1,
        };
        // SAFETY: `annot` was just created on a live page.
        unsafe {
            ffi::set_annotation_rect(&annot, rect);
        }

        self.pending.push(cover.clone());
        Ok(())
    }

    fn apply_covers(&mut self) -> SanitizerResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        self.pdf_page
            .redact()
            .map_err(|e| SanitizerError::PdfProcessing {
                message: format!("Failed to apply redactions on page {}", self.number),
                page: Some(self.number),
                source: Some(Box::new(e)),
            })?;

        let applied = self.pending.len();
        self.redraws.append(&mut self.pending);
        Ok(applied)
    }
}
