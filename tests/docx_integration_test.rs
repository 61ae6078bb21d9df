//! End-to-end DOCX sanitization through the service layer.

mod common;

use anyhow::Result;
use common::*;
use pii_sanitizer::{EngineConfig, ReplacementCandidate, ReplacementSet, SanitizeService, SanitizeStats};
use tempfile::TempDir;

fn service() -> SanitizeService {
    SanitizeService::new(EngineConfig::default()).unwrap()
}

fn candidate(original: &str, kind: &str, replacement: &str) -> ReplacementCandidate {
    ReplacementCandidate::new(original, kind, replacement)
}

#[test]
fn test_cross_run_email_keeps_run_formatting() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_runs(&["Email: priya", ".fernando92@finance", ".lk"])
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let stats = service().sanitize(
        &input,
        &output,
        &[candidate("priya.fernando92@finance.lk", "email", "person_1@example.com")],
    )?;

    assert_eq!(stats.replacements_applied, 1);
    assert_eq!(stats.safety_net_added, 0);
    assert_preserved(&output, "Email: person_1@example.com");
    assert_redacted(&output, "fernando92");

    let document = read_part(&output, "word/document.xml")?.unwrap();
    assert_eq!(document.matches("<w:r>").count(), 3, "runs must not be merged");
    assert!(document.contains("<w:rPr><w:b/></w:rPr>"));
    Ok(())
}

#[test]
fn test_longest_first_and_short_token() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_paragraph("Email Priya Anjali Fernando at work")
        .with_paragraph("IT within the City audit, IT team")
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    service().sanitize(
        &input,
        &output,
        &[
            candidate("Priya", "name", "Person_1"),
            candidate("Priya Anjali Fernando", "name", "Person_1"),
            candidate("IT", "org", "ORG_1"),
        ],
    )?;

    assert_preserved(&output, "Email Person_1 at work");
    assert_preserved(&output, "ORG_1 within the City audit, ORG_1 team");
    Ok(())
}

#[test]
fn test_hyperlink_target_removed() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_hyperlink("Write to ", &["priya@x.lk"], " today", "mailto:priya@x.lk")
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let stats = service().sanitize(&input, &output, &[candidate("priya@x.lk", "email", "person_1@example.com")])?;

    assert_eq!(stats.links_unwrapped, 1);
    assert_preserved(&output, "Write to person_1@example.com today");
    assert_part_lacks(&output, "word/document.xml", "w:hyperlink");
    assert_part_lacks(&output, "word/_rels/document.xml.rels", "mailto:");
    assert_part_lacks(&output, "word/_rels/document.xml.rels", "rIdLink1");
    Ok(())
}

#[test]
fn test_image_placeholders_numbered() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_paragraph("Profile")
        .with_picture()
        .with_picture()
        .with_header_picture("Company")
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let stats = service().sanitize(&input, &output, &[candidate("Nobody Here", "name", "Person_9")])?;

    assert_eq!(stats.images_replaced, 3);
    assert_eq!(stats.replacements_applied, 0);
    assert_part_contains(&output, "word/document.xml", "[Photo-1] ");
    assert_part_contains(&output, "word/document.xml", "[Photo-2] ");
    assert_part_contains(&output, "word/header1.xml", "[Header Image] ");
    assert_part_lacks(&output, "word/document.xml", "w:drawing");
    assert_part_lacks(&output, "word/_rels/document.xml.rels", "rIdImg");

    let names = part_names(&output)?;
    assert!(names.iter().all(|n| !n.starts_with("word/media/")), "{:?}", names);
    Ok(())
}

#[test]
fn test_image_placeholders_disabled() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_paragraph("Kamal")
        .with_picture()
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let service = SanitizeService::new(EngineConfig::default().with_image_placeholders(false))?;
    let stats = service.sanitize(&input, &output, &[candidate("Kamal", "name", "Person_1")])?;

    assert_eq!(stats.images_replaced, 0);
    assert_part_contains(&output, "word/document.xml", "w:drawing");
    assert!(part_names(&output)?.contains(&"word/media/image1.png".to_string()));
    Ok(())
}

#[test]
fn test_safety_net_adds_uncovered_contacts() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_paragraph("Kamal Perera, kamal@corp.lk, +94 77 123 4567")
        .with_header("NIC 912345678V")
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let stats = service().sanitize(&input, &output, &[candidate("Kamal Perera", "name", "Person_1")])?;

    assert_eq!(stats.safety_net_added, 3);
    assert_preserved(&output, "Person_1, person_1@example.com, +00 00 000 0001");
    assert_preserved(&output, "NIC ID_000001");
    Ok(())
}

#[test]
fn test_degraded_rewrite_inside_revision() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_raw_paragraph(r#"<w:p><w:ins w:id="1" w:author="a"><w:r><w:t>Call Kamal Perera now</w:t></w:r></w:ins></w:p>"#)
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let service = SanitizeService::new(EngineConfig::default().with_safety_net(false))?;
    let stats = service.sanitize(&input, &output, &[candidate("Kamal Perera", "name", "Person_2")])?;

    assert_eq!(stats.degraded_rewrites, 1);
    assert_preserved(&output, "Call Person_2 now");
    assert_part_contains(&output, "word/document.xml", "<w:ins");
    Ok(())
}

#[test]
fn test_empty_set_copies_input() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_paragraph("Nothing to see")
        .with_picture()
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let stats = service().sanitize_with_set(&input, &output, &ReplacementSet::new())?;

    assert_eq!(stats, SanitizeStats::none());
    assert_eq!(std::fs::read(&input)?, std::fs::read(&output)?);
    Ok(())
}

#[test]
fn test_extract_text_covers_header() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_runs(&["Hello ", "World"])
        .with_paragraph("   ")
        .with_header("Letterhead")
        .build(&dir.path().join("in.docx"))?;

    let text = service().extract_text(&input)?;
    assert_eq!(text, "Hello World\nLetterhead");
    Ok(())
}

#[test]
fn test_name_split_by_tabs_is_replaced() -> Result<()> {
    let dir = TempDir::new()?;
    let input = DocxBuilder::new()
        .with_raw_paragraph(
            r#"<w:p><w:r><w:t>Patient:</w:t><w:tab/><w:t>Kamal</w:t><w:tab/><w:t>Perera</w:t></w:r></w:p>"#,
        )
        .with_raw_paragraph(r#"<w:p><w:r><w:t>Dept</w:t><w:tab/><w:t>IT</w:t></w:r></w:p>"#)
        .build(&dir.path().join("in.docx"))?;
    let output = dir.path().join("out.docx");

    let service = SanitizeService::new(EngineConfig::default().with_safety_net(false))?;
    let stats = service.sanitize(
        &input,
        &output,
        &[candidate("Kamal Perera", "name", "Person_1"), candidate("IT", "org", "ORG_1")],
    )?;

    assert_eq!(stats.replacements_applied, 2);
    assert_eq!(stats.degraded_rewrites, 0);
    assert_preserved(&output, "Patient:\tPerson_1");
    assert_preserved(&output, "Dept\tORG_1");
    assert_part_lacks(&output, "word/document.xml", "Perera");
    assert_part_contains(
        &output,
        "word/document.xml",
        r#"<w:t xml:space="preserve">Patient:</w:t><w:tab/><w:t xml:space="preserve">Person_1</w:t>"#,
    );
    Ok(())
}
