//! FFI helpers for MuPDF operations the safe bindings do not expose.

use crate::domain::StyleFlags;
use mupdf::pdf::PdfAnnotation;
use mupdf::{Rect, TextChar};
use std::ffi::CStr;

/// Sets the rectangle for a PDF annotation via FFI.
///
/// # Safety
/// The annotation must be valid and the MuPDF context initialized.
pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
    #[repr(C)]
    struct PdfAnnotRaw {
        inner: *mut mupdf_sys::pdf_annot,
    }

    let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
    let ctx = mupdf_sys::mupdf_new_base_context();

    if !ctx.is_null() {
        let fz_rect = mupdf_sys::fz_rect {
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
        };

        mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
        mupdf_sys::mupdf_drop_base_context(ctx);
    }
}

/// Font and color of one structured-text character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharStyle {
    pub font: String,
    pub flags: StyleFlags,
    /// Packed `0xRRGGBB`
    pub color: u32,
}

/// Reads the font name, style bits and fill color of a text character.
///
/// # Safety
/// `ch` must come from a live text page and the MuPDF context must be
/// initialized.
pub unsafe fn char_style(ch: &TextChar) -> Option<CharStyle> {
    #[repr(C)]
    struct TextCharRaw {
        inner: *mut mupdf_sys::fz_stext_char,
    }

    let raw = std::mem::transmute::<&TextChar, &TextCharRaw>(ch);
    if raw.inner.is_null() {
        return None;
    }
    let ctx = mupdf_sys::mupdf_new_base_context();
    if ctx.is_null() {
        return None;
    }

    let stext = &*raw.inner;
    let mut style = CharStyle {
        color: (stext.color as u32) & 0x00FF_FFFF,
        ..Default::default()
    };

    let font = stext.font;
    if !font.is_null() {
        let name = mupdf_sys::fz_font_name(ctx, font);
        if !name.is_null() {
            style.font = CStr::from_ptr(name).to_string_lossy().into_owned();
        }

        let mut flags = StyleFlags::default();
        if mupdf_sys::fz_font_is_italic(ctx, font) != 0 {
            flags = flags.with(StyleFlags::ITALIC);
        }
        if mupdf_sys::fz_font_is_serif(ctx, font) != 0 {
            flags = flags.with(StyleFlags::SERIF);
        }
        if mupdf_sys::fz_font_is_monospaced(ctx, font) != 0 {
            flags = flags.with(StyleFlags::MONOSPACE);
        }
        if mupdf_sys::fz_font_is_bold(ctx, font) != 0 {
            flags = flags.with(StyleFlags::BOLD);
        }
        style.flags = flags;
    }

    mupdf_sys::mupdf_drop_base_context(ctx);
    Some(style)
}
