//! Post-save pass over the redacted file with lopdf.
//!
//! Draws every applied cover (white box plus replacement text in a standard
//! font) and strips metadata, scripts, attachments, thumbnails and hidden
//! text before writing the file back in place.

use crate::domain::StandardFont;
use crate::error::SanitizerResult;
use crate::page::{CoverAndRedraw, Rgb, ScrubReport};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::HashMap;
use std::path::Path;

const HIDDEN_RENDER_MODE: i64 = 3;
const DEFAULT_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];
/// Descender share of the font size, used to place the baseline.
const DESCENT: f32 = 0.22;

/// Redraws `redraws` (indexed by zero-based page) onto `path` and scrubs it.
pub fn finish(path: &Path, redraws: &[Vec<CoverAndRedraw>]) -> SanitizerResult<ScrubReport> {
    let mut doc = Document::load(path)?;
    let mut report = ScrubReport::default();

    scrub_catalog(&mut doc, &mut report)?;

    let mut fonts: HashMap<StandardFont, ObjectId> = HashMap::new();
    for (page_number, page_id) in doc.get_pages() {
        scrub_page(&mut doc, page_id, &mut report)?;

        let covers = redraws
            .get(page_number.saturating_sub(1) as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        rewrite_content(&mut doc, page_id, covers, &mut fonts, &mut report)?;
    }

    doc.prune_objects();
    doc.compress();
    doc.save(path)?;

    tracing::info!(
        metadata = report.metadata_removed,
        scripts = report.scripts_removed,
        attachments = report.attachments_removed,
        thumbnails = report.thumbnails_removed,
        hidden_text = report.hidden_text_removed,
        "scrubbed PDF"
    );
    Ok(report)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Looks up `key` on the page, following the `Parent` chain.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value).clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let parse = |obj: Object| -> Option<[f32; 4]> {
        let values: Vec<f32> = obj
            .as_array()
            .ok()?
            .iter()
            .filter_map(|o| number(resolve(doc, o)))
            .collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Some([x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)]),
            _ => None,
        }
    };
    inherited(doc, page_id, b"CropBox")
        .and_then(parse)
        .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(parse))
        .unwrap_or(DEFAULT_PAGE_BOX)
}

fn scrub_names(names: &mut Dictionary, report: &mut ScrubReport) {
    if names.remove(b"JavaScript").is_some() {
        report.scripts_removed += 1;
    }
    if names.remove(b"EmbeddedFiles").is_some() {
        report.attachments_removed += 1;
    }
}

fn scrub_catalog(doc: &mut Document, report: &mut ScrubReport) -> SanitizerResult<()> {
    if doc.trailer.remove(b"Info").is_some() {
        report.metadata_removed += 1;
    }

    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let names_ref = {
        let catalog = doc.get_object_mut(root_id)?.as_dict_mut()?;
        if catalog.remove(b"Metadata").is_some() {
            report.metadata_removed += 1;
        }
        for key in [b"OpenAction".as_slice(), b"AA".as_slice()] {
            if catalog.remove(key).is_some() {
                report.scripts_removed += 1;
            }
        }
        match catalog.get_mut(b"Names") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(names)) => {
                scrub_names(names, report);
                None
            }
            _ => None,
        }
    };

    if let Some(id) = names_ref {
        if let Ok(names) = doc.get_object_mut(id).and_then(Object::as_dict_mut) {
            scrub_names(names, report);
        }
    }
    Ok(())
}

fn is_file_attachment(doc: &Document, annot: &Object) -> bool {
    resolve(doc, annot)
        .as_dict()
        .ok()
        .and_then(|d| d.get(b"Subtype").ok())
        .and_then(|s| s.as_name().ok())
        .is_some_and(|name| name == b"FileAttachment")
}

fn scrub_page(doc: &mut Document, page_id: ObjectId, report: &mut ScrubReport) -> SanitizerResult<()> {
    let kept_annots = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Annots").map(|a| resolve(doc, a)) {
            Ok(Object::Array(annots)) => {
                let kept: Vec<Object> = annots
                    .iter()
                    .filter(|a| !is_file_attachment(doc, a))
                    .cloned()
                    .collect();
                let dropped = annots.len() - kept.len();
                (dropped > 0).then_some((kept, dropped))
            }
            _ => None,
        }
    };

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    if page.remove(b"AA").is_some() {
        report.scripts_removed += 1;
    }
    if page.remove(b"Thumb").is_some() {
        report.thumbnails_removed += 1;
    }
    if let Some((kept, dropped)) = kept_annots {
        page.set("Annots", Object::Array(kept));
        report.attachments_removed += dropped;
    }
    Ok(())
}

/// Drops text shown in render mode 3. Returns the rewritten operations and
/// how many show operations were removed.
pub fn strip_hidden_text(operations: Vec<Operation>) -> (Vec<Operation>, usize) {
    let mut saved = Vec::new();
    let mut mode = 0;
    let mut removed = 0;
    let mut out = Vec::with_capacity(operations.len());

    for op in operations {
        let hidden = mode == HIDDEN_RENDER_MODE;
        match op.operator.as_str() {
            "q" => saved.push(mode),
            "Q" => mode = saved.pop().unwrap_or(0),
            "Tr" => {
                mode = op.operands.first().and_then(|o| o.as_i64().ok()).unwrap_or(mode);
            }
            "Tj" | "TJ" if hidden => {
                removed += 1;
                continue;
            }
            "'" if hidden => {
                removed += 1;
                out.push(Operation::new("T*", vec![]));
                continue;
            }
            "\"" if hidden => {
                removed += 1;
                let mut operands = op.operands.into_iter();
                if let Some(word_spacing) = operands.next() {
                    out.push(Operation::new("Tw", vec![word_spacing]));
                }
                if let Some(char_spacing) = operands.next() {
                    out.push(Operation::new("Tc", vec![char_spacing]));
                }
                out.push(Operation::new("T*", vec![]));
                continue;
            }
            _ => {}
        }
        out.push(op);
    }
    (out, removed)
}

/// WinAnsi bytes for `text`; characters outside the encoding become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn fill_color(color: Rgb, operator: &str) -> Operation {
    Operation::new(operator, vec![real(color.r), real(color.g), real(color.b)])
}

fn resource_name(font: StandardFont) -> String {
    format!("DS{}", font.code())
}

/// Operators painting `cover` on a page whose visible box is `page_box`.
fn cover_operations(cover: &CoverAndRedraw, page_box: [f32; 4]) -> Vec<Operation> {
    let x = page_box[0] + cover.rect.x0;
    let bottom = page_box[3] - cover.rect.y1;
    let width = cover.rect.width();
    let height = cover.rect.height();

    let mut ops = vec![
        Operation::new("q", vec![]),
        fill_color(cover.fill, "rg"),
        Operation::new("re", vec![real(x), real(bottom), real(width), real(height)]),
        Operation::new("f", vec![]),
    ];

    if !cover.text.is_empty() {
        let size = cover.style.size;
        let baseline = bottom + (height - size).max(0.0) / 2.0 + DESCENT * size;
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(resource_name(cover.style.font).into_bytes()), real(size)],
            ),
            fill_color(cover.style.color, "rg"),
            Operation::new("Tr", vec![Object::Integer(0)]),
            Operation::new("Td", vec![real(x), real(baseline)]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&cover.text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }
    ops.push(Operation::new("Q", vec![]));
    ops
}

fn font_object(doc: &mut Document, fonts: &mut HashMap<StandardFont, ObjectId>, font: StandardFont) -> ObjectId {
    *fonts.entry(font).or_insert_with(|| {
        let mut dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_name(),
        };
        if !font.uses_builtin_encoding() {
            dict.set("Encoding", "WinAnsiEncoding");
        }
        doc.add_object(dict)
    })
}

/// Adds the standard fonts used by `covers` to the page's own resources.
fn register_fonts(
    doc: &mut Document,
    page_id: ObjectId,
    covers: &[CoverAndRedraw],
    fonts: &mut HashMap<StandardFont, ObjectId>,
) -> SanitizerResult<()> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut font_dict = match resources.get(b"Font").map(|f| resolve(doc, f)) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    for cover in covers.iter().filter(|c| !c.text.is_empty()) {
        let font = cover.style.font;
        let id = font_object(doc, fonts, font);
        font_dict.set(resource_name(font), Object::Reference(id));
    }

    resources.set("Font", Object::Dictionary(font_dict));
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn rewrite_content(
    doc: &mut Document,
    page_id: ObjectId,
    covers: &[CoverAndRedraw],
    fonts: &mut HashMap<StandardFont, ObjectId>,
    report: &mut ScrubReport,
) -> SanitizerResult<()> {
    let original = doc.get_page_content(page_id)?;
    let mut body = original.clone();

    match Content::decode(&original) {
        Ok(content) => {
            let (operations, removed) = strip_hidden_text(content.operations);
            if removed > 0 {
                body = Content { operations }.encode()?;
                report.hidden_text_removed += removed;
            }
        }
        Err(e) => {
            tracing::warn!(page = ?page_id, error = %e, "could not decode page content, hidden text kept");
        }
    }

    if !covers.is_empty() {
        register_fonts(doc, page_id, covers, fonts)?;
        let page_box = page_box(doc, page_id);
        let overlay: Vec<Operation> = covers
            .iter()
            .flat_map(|cover| cover_operations(cover, page_box))
            .collect();

        let mut wrapped = b"q\n".to_vec();
        wrapped.extend_from_slice(&body);
        wrapped.extend_from_slice(b"\nQ\n");
        wrapped.extend(Content { operations: overlay }.encode()?);
        body = wrapped;
        tracing::debug!(page = ?page_id, covers = covers.len(), "redrew replacement text");
    }

    if body != original {
        let stream_id = doc.add_object(Stream::new(dictionary! {}, body));
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set("Contents", Object::Reference(stream_id));
    }
    Ok(())
}
