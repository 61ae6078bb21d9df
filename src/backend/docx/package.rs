//! DOCX zip package and relationship parts.

use super::xml::{self, XmlNode};
use crate::error::{SanitizerError, SanitizerResult};
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const MAIN_PART: &str = "word/document.xml";
const MEDIA_PREFIX: &str = "word/media/";

/// One archive entry with the compression method it was stored with.
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    method: CompressionMethod,
}

/// All entries of a DOCX package, in archive order.
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> SanitizerResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| SanitizerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> SanitizerResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| SanitizerError::malformed("DOCX", format!("not a zip package: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                method: writable_method(file.compression()),
            });
        }

        let package = Self { entries };
        if package.part(MAIN_PART).is_none() {
            return Err(SanitizerError::malformed("DOCX", format!("missing {}", MAIN_PART)));
        }
        Ok(package)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                method: CompressionMethod::Deflated,
            }),
        }
    }

    pub fn remove_part(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before != self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Parts that carry document text: body, headers, footers and notes.
    pub fn text_parts(&self) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        let mut footers: Vec<String> = Vec::new();
        for name in self.names() {
            let Some(file) = name.strip_prefix("word/") else {
                continue;
            };
            if file.contains('/') || !file.ends_with(".xml") {
                continue;
            }
            if file.starts_with("header") {
                headers.push(name.to_string());
            } else if file.starts_with("footer") {
                footers.push(name.to_string());
            }
        }
        headers.sort();
        footers.sort();

        let mut parts = vec![MAIN_PART.to_string()];
        parts.extend(headers);
        parts.extend(footers);
        for notes in ["word/footnotes.xml", "word/endnotes.xml"] {
            if self.part(notes).is_some() {
                parts.push(notes.to_string());
            }
        }
        parts
    }

    /// Removes relationships by id from the rels part of `part`.
    /// Returns the number removed.
    pub fn remove_relationships(&mut self, part: &str, ids: &BTreeSet<String>) -> SanitizerResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let rels_name = rels_part_for(part);
        let Some(data) = self.part(&rels_name) else {
            return Ok(0);
        };

        let mut nodes = xml::parse(data)?;
        let mut removed = 0;
        if let Some(root) = xml::root_mut(&mut nodes) {
            root.children.retain(|node| {
                let discard = node
                    .as_element()
                    .and_then(|el| el.attr(b"Id"))
                    .is_some_and(|id| ids.contains(&id));
                removed += usize::from(discard);
                !discard
            });
        }
        if removed > 0 {
            self.set_part(&rels_name, xml::write(&nodes)?);
        }
        Ok(removed)
    }

    /// Deletes media entries no relationship part points at.
    pub fn prune_unreferenced_media(&mut self) -> SanitizerResult<usize> {
        let mut referenced = BTreeSet::new();
        let rels: Vec<String> = self
            .names()
            .filter(|n| n.ends_with(".rels"))
            .map(str::to_string)
            .collect();

        for rels_name in rels {
            let Some(data) = self.part(&rels_name) else {
                continue;
            };
            let nodes = xml::parse(data)?;
            if let Some(root) = xml::root(&nodes) {
                for rel in root.elements() {
                    let external = rel.attr(b"TargetMode").is_some_and(|m| m == "External");
                    if let (Some(target), false) = (rel.attr(b"Target"), external) {
                        referenced.insert(resolve_target(&rels_name, &target));
                    }
                }
            }
        }

        let unused: Vec<String> = self
            .names()
            .filter(|n| n.starts_with(MEDIA_PREFIX) && !referenced.contains(*n))
            .map(str::to_string)
            .collect();
        for name in &unused {
            tracing::debug!(part = %name, "removing unreferenced media");
            self.remove_part(name);
        }
        Ok(unused.len())
    }

    pub fn to_bytes(&self) -> SanitizerResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let options = SimpleFileOptions::default().compression_method(entry.method);
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.data)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> SanitizerResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| SanitizerError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Methods other than stored are rewritten deflated.
fn writable_method(method: CompressionMethod) -> CompressionMethod {
    match method {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolves a relationship target against the directory of its source part.
pub fn resolve_target(rels_name: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    // "word/_rels/document.xml.rels" has its source part in "word".
    let base = rels_name
        .rsplit_once("_rels/")
        .map(|(dir, _)| dir.trim_end_matches('/'))
        .unwrap_or("");

    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Parses one XML part of a package.
pub fn parse_part(package: &DocxPackage, name: &str) -> SanitizerResult<Option<Vec<XmlNode>>> {
    package.part(name).map(xml::parse).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_name() {
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_part_for("word/header1.xml"), "word/_rels/header1.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/_rels/document.xml.rels", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word/_rels/document.xml.rels", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("_rels/.rels", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("word/_rels/document.xml.rels", "/word/media/a.png"), "word/media/a.png");
    }

    fn zip_with(entries: &[(&str, CompressionMethod)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, method) in entries {
            let options = SimpleFileOptions::default().compression_method(*method);
            writer.start_file(*name, options).unwrap();
            writer.write_all(b"<w:document/>").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn methods(bytes: &[u8]) -> Vec<(String, CompressionMethod)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let file = archive.by_index(i).unwrap();
                (file.name().to_string(), file.compression())
            })
            .collect()
    }

    #[test]
    fn test_entry_compression_survives_rewrite() {
        let original = zip_with(&[
            ("[Content_Types].xml", CompressionMethod::Deflated),
            (MAIN_PART, CompressionMethod::Stored),
            ("word/media/image1.png", CompressionMethod::Deflated),
        ]);
        let mut package = DocxPackage::from_bytes(&original).unwrap();
        package.set_part(MAIN_PART, b"<w:document><w:body/></w:document>".to_vec());
        package.set_part("word/new.xml", b"<x/>".to_vec());

        assert_eq!(
            methods(&package.to_bytes().unwrap()),
            vec![
                ("[Content_Types].xml".to_string(), CompressionMethod::Deflated),
                (MAIN_PART.to_string(), CompressionMethod::Stored),
                ("word/media/image1.png".to_string(), CompressionMethod::Deflated),
                ("word/new.xml".to_string(), CompressionMethod::Deflated),
            ]
        );
    }

    #[test]
    fn test_rejects_non_zip() {
        let err = DocxPackage::from_bytes(b"not a zip").unwrap_err();
        assert!(err.is_fatal_document_error());
    }
}
