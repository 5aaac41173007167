// Resume text extraction.
// Implements: extension sniffing, PDF text (pdf-extract via a scoped temp file),
// DOCX paragraph text (zip + quick-xml).

pub mod docx;
pub mod pdf;

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file format: {0}. Upload a .pdf or .docx file.")]
    UnsupportedFormat(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read DOCX: {0}")]
    Docx(String),

    #[error("No text could be extracted from '{0}'")]
    NoText(String),

    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),
}

/// The two upload formats we accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Classifies by the text after the last `.`, ignoring ASCII case.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(format!("'{file_name}'")))?;

        if ext.eq_ignore_ascii_case("pdf") {
            Ok(DocumentKind::Pdf)
        } else if ext.eq_ignore_ascii_case("docx") {
            Ok(DocumentKind::Docx)
        } else {
            Err(ExtractionError::UnsupportedFormat(format!(".{ext}")))
        }
    }
}

/// An uploaded resume, consumed once by [`extract_text`].
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

impl ResumeDocument {
    pub fn from_upload(file_name: &str, bytes: Bytes) -> Result<Self, ExtractionError> {
        Ok(Self {
            file_name: file_name.to_string(),
            kind: DocumentKind::from_file_name(file_name)?,
            bytes,
        })
    }
}

/// Text extracted from a resume. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlainResumeText(String);

impl PlainResumeText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.0.lines()
    }

    /// True when there is nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PlainResumeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts plain text from a PDF or DOCX upload.
/// A document that yields only whitespace is reported as `NoText`.
pub async fn extract_text(document: ResumeDocument) -> Result<PlainResumeText, ExtractionError> {
    let ResumeDocument {
        file_name,
        kind,
        bytes,
    } = document;

    let text = match kind {
        DocumentKind::Pdf => pdf::extract_pdf_text(bytes).await?,
        DocumentKind::Docx => docx::extract_docx_text(&bytes)?,
    };

    let text = PlainResumeText::new(text);
    if text.is_empty() {
        return Err(ExtractionError::NoText(file_name));
    }

    info!(
        "Extracted {} lines from {:?} upload '{}'",
        text.lines().count(),
        kind,
        file_name
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_file_name("resume.pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("cv.final.docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_file_name("Resume.PDF").unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn test_unsupported_extensions_rejected() {
        for name in ["resume.doc", "resume.txt", "resume", "resume.pdf.zip"] {
            let err = DocumentKind::from_file_name(name).unwrap_err();
            assert!(
                matches!(err, ExtractionError::UnsupportedFormat(_)),
                "{name} should be unsupported"
            );
        }
    }

    #[test]
    fn test_unsupported_message_is_user_facing() {
        let err = DocumentKind::from_file_name("notes.txt").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file format: .txt. Upload a .pdf or .docx file."
        );
    }

    #[test]
    fn test_plain_text_whitespace_only_is_empty() {
        assert!(PlainResumeText::new(" \n\t ").is_empty());
        assert!(!PlainResumeText::new("Engineer").is_empty());
    }

    #[tokio::test]
    async fn test_extract_text_dispatches_docx() {
        let bytes = docx::tests::build_docx(&["Jane Doe", "", "Engineer"]);
        let document = ResumeDocument::from_upload("jane.docx", Bytes::from(bytes)).unwrap();
        let text = extract_text(document).await.unwrap();
        assert_eq!(text.as_str(), "Jane Doe\nEngineer");
    }

    #[tokio::test]
    async fn test_extract_text_dispatches_pdf() {
        let bytes = pdf::tests::build_pdf(&["Jane Doe", "QA Engineer"]);
        let document = ResumeDocument::from_upload("Jane.PDF", Bytes::from(bytes)).unwrap();
        let text = extract_text(document).await.unwrap();
        assert!(text.as_str().contains("Jane Doe"), "{text}");
        assert!(text.as_str().contains("QA Engineer"), "{text}");
    }

    #[tokio::test]
    async fn test_blank_document_is_no_text() {
        let bytes = docx::tests::build_docx(&["", "   "]);
        let document = ResumeDocument::from_upload("blank.docx", Bytes::from(bytes)).unwrap();
        let err = extract_text(document).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoText(ref name) if name == "blank.docx"));
    }
}
