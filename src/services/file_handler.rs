// File Handler
// Upload validation and plain-text extraction for .txt, .docx and .pdf.
// Only the command-line driver calls into this; the analysis core takes text.

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("File too large ({size_mb:.2}MB). Maximum size is {max_mb}MB")]
    TooLarge { size_mb: f64, max_mb: u64 },
    #[error("File is not readable: {0}")]
    Unreadable(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("No text could be extracted from {0}")]
    EmptyText(String),
    #[error("DOCX parse error: {0}")]
    Docx(String),
    #[error("PDF extraction error: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Txt,
    Docx,
    Pdf,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Txt),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Reject missing, unreadable or oversized files before extraction.
pub fn validate_file(path: &Path, max_size_mb: u64) -> Result<(), FileError> {
    let shown = path.display().to_string();
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FileError::NotFound(shown.clone()),
        _ => FileError::Unreadable(format!("{}: {}", shown, e)),
    })?;

    if !meta.is_file() {
        return Err(FileError::Unreadable(shown));
    }

    let size_mb = meta.len() as f64 / BYTES_PER_MB;
    if size_mb > max_size_mb as f64 {
        warn!(path = %shown, size_mb, max_mb = max_size_mb, "file too large");
        return Err(FileError::TooLarge {
            size_mb,
            max_mb: max_size_mb,
        });
    }

    fs::File::open(path).map_err(|e| FileError::Unreadable(format!("{}: {}", shown, e)))?;
    Ok(())
}

/// Extract text, dispatching on the file extension.
pub fn extract_text(path: &Path) -> Result<String, FileError> {
    let shown = path.display().to_string();
    let kind = FileKind::from_path(path).ok_or_else(|| FileError::UnsupportedFormat(shown.clone()))?;
    let bytes = fs::read(path).map_err(|e| FileError::Unreadable(format!("{}: {}", shown, e)))?;

    let text = match kind {
        FileKind::Txt => decode_txt(&bytes),
        FileKind::Docx => extract_docx_text(&bytes)?,
        FileKind::Pdf => extract_pdf_text(&bytes)?,
    };

    if text.trim().is_empty() {
        warn!(path = %shown, "no text extracted");
        return Err(FileError::EmptyText(shown));
    }

    info!(path = %shown, kind = ?kind, chars = text.chars().count(), "file.extracted");
    Ok(text)
}

/// UTF-8 first, then Latin-1 (every byte maps to one code point).
pub fn decode_txt(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Paragraph text joined by newlines; tables and images are skipped.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, FileError> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let docx = docx_rs::read_docx(bytes).map_err(|e| FileError::Docx(format!("{:?}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(para),
            _ => None,
        })
        .map(|para| {
            para.children
                .iter()
                .filter_map(|pc| match pc {
                    ParagraphChild::Run(run) => Some(run),
                    _ => None,
                })
                .flat_map(|run| run.children.iter())
                .filter_map(|rc| match rc {
                    RunChild::Text(t) => Some(t.text.as_str()),
                    _ => None,
                })
                .collect::<String>()
        })
        .filter(|p| !p.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, FileError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| FileError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("notes.TXT")), Some(FileKind::Txt));
        assert_eq!(FileKind::from_path(Path::new("a/b.docx")), Some(FileKind::Docx));
        assert_eq!(FileKind::from_path(Path::new("x.pdf")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("x.rtf")), None);
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_decode_txt_falls_back_to_latin1() {
        assert_eq!(decode_txt("caf\u{e9}".as_bytes()), "caf\u{e9}");
        assert_eq!(decode_txt(&[b'c', b'a', b'f', 0xe9]), "caf\u{e9}");
        assert_eq!(decode_txt("\u{feff}bom".as_bytes()), "bom");
    }

    #[test]
    fn test_validate_missing_file() {
        let err = validate_file(Path::new("/definitely/not/here.txt"), 10).unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }

    #[test]
    fn test_validate_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&vec![b'a'; 1024 * 1024 + 1]).unwrap();
        drop(f);

        assert!(matches!(validate_file(&path, 1), Err(FileError::TooLarge { max_mb: 1, .. })));
        assert!(validate_file(&path, 2).is_ok());
    }

    #[test]
    fn test_extract_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Cells divide by mitosis.").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "Cells divide by mitosis.");
    }

    #[test]
    fn test_extract_rejects_empty_and_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "   \n").unwrap();
        assert!(matches!(extract_text(&empty), Err(FileError::EmptyText(_))));

        let rtf = dir.path().join("notes.rtf");
        fs::write(&rtf, "text").unwrap();
        assert!(matches!(extract_text(&rtf), Err(FileError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_errors_name_the_offending_path() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("blank.txt");
        fs::write(&empty, "\n").unwrap();
        match extract_text(&empty) {
            Err(FileError::EmptyText(p)) => assert!(p.ends_with("blank.txt")),
            other => panic!("expected EmptyText, got {:?}", other),
        }

        let big = dir.path().join("big.txt");
        fs::write(&big, vec![b'a'; 2 * 1024 * 1024]).unwrap();
        let err = validate_file(&big, 1).unwrap_err();
        assert!(err.to_string().contains("Maximum size is 1MB"));

        let missing = dir.path().join("gone.pdf");
        match validate_file(&missing, 10) {
            Err(FileError::NotFound(p)) => assert!(p.ends_with("gone.pdf")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_docx_paragraphs() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Mitochondria make ATP.")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Ribosomes build proteins.")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let text = extract_docx_text(buf.get_ref()).unwrap();
        assert_eq!(text, "Mitochondria make ATP.\nRibosomes build proteins.");
    }

    #[test]
    fn test_invalid_docx_is_error() {
        assert!(matches!(extract_docx_text(b"not a zip"), Err(FileError::Docx(_))));
    }
}
