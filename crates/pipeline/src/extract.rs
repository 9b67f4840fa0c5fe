//! Plain-text extraction from uploaded manuscripts.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use storybible_core::text::decode_entities;

use crate::error::PipelineError;

const DOCX_BODY: &str = "word/document.xml";

static PARAGRAPH_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("valid regex"));
static TAB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"));
static XML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Supported upload types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file name's extension.
    pub fn from_filename(filename: &str) -> Result<Self, PipelineError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(Self::PlainText),
            "md" | "markdown" => Ok(Self::Markdown),
            "docx" => Ok(Self::Docx),
            _ => Err(PipelineError::UnsupportedFormat(
                if ext.is_empty() { filename.to_string() } else { format!(".{ext}") },
            )),
        }
    }
}

/// Extract the manuscript text of an upload, rejecting empty documents.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, PipelineError> {
    let text = match DocumentFormat::from_filename(filename)? {
        DocumentFormat::PlainText | DocumentFormat::Markdown => decode_utf8(bytes),
        DocumentFormat::Docx => extract_docx(bytes)?,
    };
    let text = normalize_newlines(&text);
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyDocument);
    }
    Ok(text)
}

fn decode_utf8(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Read `word/document.xml` out of a `.docx` archive and flatten it.
pub fn extract_docx(bytes: &[u8]) -> Result<String, PipelineError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Extract(format!("not a valid .docx archive: {e}")))?;
    let mut entry = archive
        .by_name(DOCX_BODY)
        .map_err(|_| PipelineError::Extract(format!("missing {DOCX_BODY}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| PipelineError::Extract(e.to_string()))?;
    Ok(flatten_document_xml(&xml))
}

/// Paragraph ends and breaks become newlines, tabs stay tabs, every other
/// tag is dropped and entities are decoded.
pub fn flatten_document_xml(xml: &str) -> String {
    let text = PARAGRAPH_END_RE.replace_all(xml, "\n");
    let text = TAB_RE.replace_all(&text, "\t");
    let text = XML_TAG_RE.replace_all(&text, "");
    decode_entities(&text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn docx_with(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(DOCX_BODY, SimpleFileOptions::default()).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn detects_formats() {
        assert_eq!(DocumentFormat::from_filename("book.TXT").unwrap(), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_filename("notes.md").unwrap(), DocumentFormat::Markdown);
        assert_eq!(DocumentFormat::from_filename("draft.docx").unwrap(), DocumentFormat::Docx);
        assert_matches!(
            DocumentFormat::from_filename("draft.pdf"),
            Err(PipelineError::UnsupportedFormat(ext)) if ext == ".pdf"
        );
        assert!(DocumentFormat::from_filename("README").is_err());
    }

    #[test]
    fn plain_text_strips_bom_and_crlf() {
        let text = extract_text("a.txt", "\u{feff}Chapter 1\r\nIt began.".as_bytes()).unwrap();
        assert_eq!(text, "Chapter 1\nIt began.");
    }

    #[test]
    fn empty_document_rejected() {
        assert_matches!(extract_text("a.txt", b"  \n "), Err(PipelineError::EmptyDocument));
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body>
            <w:p><w:r><w:t>Chapter 1</w:t></w:r></w:p>
            <w:p><w:r><w:t>Tom &amp; Jerry</w:t><w:tab/><w:t>ran.</w:t></w:r></w:p>
            </w:body></w:document>"#;
        let text = extract_text("m.docx", &docx_with(xml)).unwrap();
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["Chapter 1", "Tom & Jerry\tran."]);
    }

    #[test]
    fn corrupt_docx_is_an_extract_error() {
        assert_matches!(extract_text("m.docx", b"not a zip"), Err(PipelineError::Extract(_)));
        let missing = {
            let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
            writer.start_file("other.xml", SimpleFileOptions::default()).unwrap();
            writer.finish().unwrap().into_inner()
        };
        assert_matches!(extract_text("m.docx", &missing), Err(PipelineError::Extract(_)));
    }
}
