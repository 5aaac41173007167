//! DOCX text extraction.
//!
//! A DOCX file is a ZIP archive; body text lives in `word/document.xml` as a
//! sequence of `w:p` paragraphs, each holding `w:t` text runs.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Returns the document's non-blank paragraphs joined by `\n`.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| ExtractionError::Docx(format!("missing {DOCUMENT_PART}")))?
        .read_to_string(&mut xml)?;

    let paragraphs = read_paragraphs(&xml)?;
    Ok(join_paragraphs(&paragraphs))
}

/// Keeps paragraphs that are non-blank after trimming; the kept text itself is not trimmed.
pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Subtrees whose paragraphs are not part of the body flow: text boxes and the
/// legacy fallback copy of drawing content.
const SKIPPED_SUBTREES: [&[u8]; 2] = [b"txbxContent", b"Fallback"];

fn is_skipped(local_name: &[u8]) -> bool {
    SKIPPED_SUBTREES.contains(&local_name)
}

/// Walks `document.xml` and returns every body paragraph's text in document order.
fn read_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    // Open `w:p` elements, innermost last.
    let mut open: Vec<String> = Vec::new();
    let mut skip_depth = 0usize;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if is_skipped(e.local_name().as_ref()) => skip_depth += 1,
            Ok(Event::End(ref e)) if is_skipped(e.local_name().as_ref()) => {
                skip_depth = skip_depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!(
                    "malformed document.xml at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            Ok(_) if skip_depth > 0 => {}
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.extend(open.pop()),
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                // Self-closing paragraph: present but blank.
                b"p" => paragraphs.push(String::new()),
                // Tab stops in paragraph properties are also `w:tab`; only runs count.
                b"tab" if in_run => push_text(&mut open, "\t"),
                b"br" | b"cr" if in_run => push_text(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| ExtractionError::Docx(format!("bad text run: {err}")))?;
                push_text(&mut open, &text);
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    /// Builds a minimal DOCX whose body holds one single-run paragraph per entry.
    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| {
                format!(
                    r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                    escape(p)
                )
            })
            .collect();
        build_docx_from_body(&body)
    }

    pub(crate) fn build_docx_from_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:v="urn:schemas-microsoft-com:vml" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"><w:body>{body}</w:body></w:document>"#
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(DOCUMENT_PART, options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_join_drops_blank_paragraphs() {
        let paragraphs = ["", "  ", "Experience", "", "Engineer"];
        assert_eq!(join_paragraphs(&paragraphs), "Experience\nEngineer");
    }

    #[test]
    fn test_join_keeps_inner_whitespace_of_kept_paragraphs() {
        let paragraphs = ["  Led QA  ", "\t"];
        assert_eq!(join_paragraphs(&paragraphs), "  Led QA  ");
    }

    #[test]
    fn test_extract_from_generated_docx() {
        let bytes = build_docx(&["", "  ", "Experience", "", "Engineer"]);
        assert_eq!(extract_docx_text(&bytes).unwrap(), "Experience\nEngineer");
    }

    #[test]
    fn test_runs_tabs_and_breaks_are_concatenated() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Senior</w:t></w:r><w:r><w:t xml:space="preserve"> QA</w:t></w:r></w:p>"#,
            r#"<w:p/>"#,
            r#"<w:p><w:r><w:t>Skills</w:t><w:tab/><w:t>Rust</w:t><w:br/><w:t>Python</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>R&amp;D</w:t></w:r></w:p>"#,
        );
        let bytes = build_docx_from_body(body);
        assert_eq!(
            extract_docx_text(&bytes).unwrap(),
            "Senior QA\nSkills\tRust\nPython\nR&D"
        );
    }

    #[test]
    fn test_non_text_elements_are_ignored() {
        let body = concat!(
            r#"<w:p><w:r><w:instrText>PAGE</w:instrText></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Summary</w:t></w:r></w:p>"#,
        );
        let bytes = build_docx_from_body(body);
        assert_eq!(extract_docx_text(&bytes).unwrap(), "Summary");
    }

    #[test]
    fn test_text_box_does_not_clobber_enclosing_paragraph() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Jane Doe, Senior Engineer</w:t></w:r>"#,
            r#"<w:r><w:pict><v:shape><v:textbox><w:txbxContent>"#,
            r#"<w:p><w:r><w:t>Contact box</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></v:textbox></v:shape></w:pict></w:r>"#,
            r#"<w:r><w:t xml:space="preserve"> tail</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Experience</w:t></w:r></w:p>"#,
        );
        let bytes = build_docx_from_body(body);
        assert_eq!(
            extract_docx_text(&bytes).unwrap(),
            "Jane Doe, Senior Engineer tail\nExperience"
        );
    }

    #[test]
    fn test_alternate_content_is_not_read_twice() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Summary</w:t></w:r><w:r><mc:AlternateContent>"#,
            r#"<mc:Choice Requires="wps"><w:drawing><wps:txbx><w:txbxContent>"#,
            r#"<w:p><w:r><w:t>Sidebar</w:t></w:r></w:p></w:txbxContent></wps:txbx></w:drawing></mc:Choice>"#,
            r#"<mc:Fallback><w:pict><w:p><w:r><w:t>Sidebar</w:t></w:r></w:p></w:pict></mc:Fallback>"#,
            r#"</mc:AlternateContent></w:r></w:p>"#,
        );
        let bytes = build_docx_from_body(body);
        assert_eq!(extract_docx_text(&bytes).unwrap(), "Summary");
    }

    #[test]
    fn test_not_a_zip_is_docx_error() {
        let err = extract_docx_text(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_zip_without_document_part_is_docx_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default().compression_method(CompressionMethod::Stored))
            .unwrap();
        writer.write_all(b"<styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"), "{err}");
    }
}
