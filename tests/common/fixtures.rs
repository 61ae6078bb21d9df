//! Test fixtures: DOCX and PDF builders.
//!
//! Provides builders for creating test documents with specific content,
//! following the Builder pattern for clean test setup.

use anyhow::{Context, Result};
use printpdf::*;
use std::fs;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";

/// 1x1 transparent PNG.
const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// One run with its own (distinct) formatting.
pub fn run(text: &str, bold: bool) -> String {
    let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        props,
        escape(text)
    )
}

fn picture_run(rel_id: &str) -> String {
    format!(
        concat!(
            r#"<w:r><w:drawing><wp:inline><wp:extent cx="9525" cy="9525"/>"#,
            r#"<a:graphic><a:graphicData><pic:pic><pic:blipFill>"#,
            r#"<a:blip r:embed="{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic>"#,
            r#"</wp:inline></w:drawing></w:r>"#
        ),
        rel_id
    )
}

/// Builder for minimal WordprocessingML packages.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let path = DocxBuilder::new()
///     .with_runs(&["Email: priya", ".fernando92@finance", ".lk"])
///     .with_picture()
///     .build(std::path::Path::new("/tmp/test.docx"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: Vec<String>,
    header: Vec<String>,
    relationships: Vec<(String, String, String, bool)>,
    header_relationships: Vec<(String, String, String, bool)>,
    images: usize,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a paragraph with one run per text, alternating bold formatting so
    /// adjacent runs have distinct styles.
    pub fn with_runs(mut self, texts: &[&str]) -> Self {
        let runs: String = texts
            .iter()
            .enumerate()
            .map(|(i, t)| run(t, i % 2 == 1))
            .collect();
        self.body.push(format!("<w:p>{}</w:p>", runs));
        self
    }

    /// Adds a single-run paragraph.
    pub fn with_paragraph(self, text: &str) -> Self {
        self.with_runs(&[text])
    }

    /// Adds a paragraph whose middle runs sit inside a hyperlink to `target`.
    pub fn with_hyperlink(mut self, before: &str, link_runs: &[&str], after: &str, target: &str) -> Self {
        let id = format!("rIdLink{}", self.relationships.len() + 1);
        self.relationships
            .push((id.clone(), REL_HYPERLINK.to_string(), target.to_string(), true));

        let inner: String = link_runs.iter().map(|t| run(t, false)).collect();
        self.body.push(format!(
            r#"<w:p>{}<w:hyperlink r:id="{}" w:history="1">{}</w:hyperlink>{}</w:p>"#,
            run(before, false),
            id,
            inner,
            run(after, false)
        ));
        self
    }

    /// Adds a paragraph holding only a picture.
    pub fn with_picture(mut self) -> Self {
        let id = self.add_image(false);
        self.body.push(format!("<w:p>{}</w:p>", picture_run(&id)));
        self
    }

    /// Adds a header paragraph with a picture followed by `text`.
    pub fn with_header_picture(mut self, text: &str) -> Self {
        let id = self.add_image(true);
        self.header
            .push(format!("<w:p>{}{}</w:p>", picture_run(&id), run(text, false)));
        self
    }

    /// Adds a header paragraph.
    pub fn with_header(mut self, text: &str) -> Self {
        self.header.push(format!("<w:p>{}</w:p>", run(text, false)));
        self
    }

    /// Adds a raw `w:p` element.
    pub fn with_raw_paragraph(mut self, xml: &str) -> Self {
        self.body.push(xml.to_string());
        self
    }

    fn add_image(&mut self, in_header: bool) -> String {
        self.images += 1;
        let id = format!("rIdImg{}", self.images);
        let target = format!("media/image{}.png", self.images);
        let rels = if in_header {
            &mut self.header_relationships
        } else {
            &mut self.relationships
        };
        rels.push((id.clone(), REL_IMAGE.to_string(), target, false));
        id
    }

    fn rels_xml(relationships: &[(String, String, String, bool)]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, kind, target, external) in relationships {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                id,
                kind,
                escape(target),
                mode
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn part_xml(root: &str, inner: &str) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:{root} xmlns:w="{w}" xmlns:r="{r}" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "{inner}</w:{root}>"
            ),
            root = root,
            w = W_NS,
            r = R_NS,
            inner = inner
        )
    }

    /// Serializes the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc_rels = self.relationships.clone();
        let has_header = !self.header.is_empty();
        if has_header {
            doc_rels.push((
                "rIdHeader1".to_string(),
                REL_HEADER.to_string(),
                "header1.xml".to_string(),
                false,
            ));
        }

        let section = if has_header {
            r#"<w:sectPr><w:headerReference w:type="default" r:id="rIdHeader1"/></w:sectPr>"#
        } else {
            "<w:sectPr/>"
        };
        let document = Self::part_xml(
            "document",
            &format!("<w:body>{}{}</w:body>", self.body.concat(), section),
        );

        let content_types = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#,
            "</Types>"
        );
        let root_rels = Self::rels_xml(&[(
            "rId1".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"
                .to_string(),
            "word/document.xml".to_string(),
            false,
        )]);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut add = |name: &str, data: &[u8]| -> Result<()> {
            writer.start_file(name, options)?;
            writer.write_all(data)?;
            Ok(())
        };

        add("[Content_Types].xml", content_types.as_bytes())?;
        add("_rels/.rels", root_rels.as_bytes())?;
        add("word/document.xml", document.as_bytes())?;
        add("word/_rels/document.xml.rels", Self::rels_xml(&doc_rels).as_bytes())?;
        if has_header {
            let header = Self::part_xml("hdr", &self.header.concat());
            add("word/header1.xml", header.as_bytes())?;
            add(
                "word/_rels/header1.xml.rels",
                Self::rels_xml(&self.header_relationships).as_bytes(),
            )?;
        }
        for i in 1..=self.images {
            add(&format!("word/media/image{}.png", i), PNG_PIXEL)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Builds the package and writes it to `path`.
    pub fn build(&self, path: &Path) -> Result<PathBuf> {
        fs::write(path, self.to_bytes()?)?;
        Ok(path.to_path_buf())
    }
}

/// Reads one part of a zip package as UTF-8, if present.
pub fn read_part(path: &Path, name: &str) -> Result<Option<String>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(Some(text))
}

/// Names of all entries in a zip package.
pub fn part_names(path: &Path) -> Result<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(fs::read(path)?))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Builder for creating test PDFs with custom content.
///
/// Each line is drawn separately in Helvetica, top to bottom.
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    lines: Vec<String>,
    font_size: f32,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    /// Creates a new test PDF builder with default settings.
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            lines: Vec::new(),
            font_size: 12.0,
            page_width: Mm(210.0),  // A4 width
            page_height: Mm(297.0), // A4 height
        }
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds one line of text.
    pub fn with_line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let current_layer = doc.get_page(page1).get_layer(layer1);
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let step = self.font_size * 0.3528 * 1.6;
        for (i, line) in self.lines.iter().enumerate() {
            let y = 270.0 - step * i as f32;
            current_layer.use_text(line.as_str(), self.font_size, Mm(20.0), Mm(y), &font);
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds a document JavaScript name tree, an open action and an embedded file
/// to an existing PDF.
pub fn add_scripts_and_attachment(path: &Path) -> Result<()> {
    use ::lopdf::{dictionary, Object, Stream, StringFormat};

    let mut doc = ::lopdf::Document::load(path)?;

    let script = doc.add_object(dictionary! {
        "S" => "JavaScript",
        "JS" => Object::String(b"app.alert('hi')".to_vec(), StringFormat::Literal),
    });
    let file = doc.add_object(Stream::new(dictionary! { "Type" => "EmbeddedFile" }, b"secret".to_vec()));
    let filespec = doc.add_object(dictionary! {
        "Type" => "Filespec",
        "F" => Object::String(b"secret.txt".to_vec(), StringFormat::Literal),
        "EF" => dictionary! { "F" => file },
    });
    let names = dictionary! {
        "JavaScript" => dictionary! {
            "Names" => vec![Object::String(b"init".to_vec(), StringFormat::Literal), script.into()],
        },
        "EmbeddedFiles" => dictionary! {
            "Names" => vec![Object::String(b"secret.txt".to_vec(), StringFormat::Literal), filespec.into()],
        },
    };

    let root = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_object_mut(root)?.as_dict_mut()?;
    catalog.set("Names", names);
    catalog.set("OpenAction", Object::Reference(script));

    doc.save(path)?;
    Ok(())
}
