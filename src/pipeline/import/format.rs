//! Document format detection.
//!
//! Binary formats are identified from magic bytes (extensions can be wrong).
//! The OOXML family all share the ZIP signature, so the extension breaks the
//! tie there; plain-text formats have no signature and fall back to a
//! printability heuristic plus the extension for TXT vs CSV.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::error::PipelineError;

/// The document formats the pipeline can route to an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Docx,
    Pdf,
    Xlsx,
    Pptx,
    Csv,
    Txt,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "xlsx" => Some(Self::Xlsx),
            "pptx" => Some(Self::Pptx),
            "csv" => Some(Self::Csv),
            "txt" | "text" | "md" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn all() -> &'static [DocumentFormat] {
        &[
            Self::Docx,
            Self::Pdf,
            Self::Xlsx,
            Self::Pptx,
            Self::Csv,
            Self::Txt,
        ]
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Files above this size are rejected at validation.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100MB

/// Detect a file's format. Errors are validation failures: missing, empty,
/// oversized, or unrecognized files.
pub fn detect_format(path: &Path) -> Result<DocumentFormat, PipelineError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        PipelineError::Validation(format!("Cannot access {}: {e}", path.display()))
    })?;

    if metadata.len() == 0 {
        return Err(PipelineError::Validation(format!(
            "File is empty: {}",
            path.display()
        )));
    }
    if metadata.len() > MAX_FILE_SIZE {
        return Err(PipelineError::Validation(format!(
            "File exceeds {}MB limit: {}",
            MAX_FILE_SIZE / (1024 * 1024),
            path.display()
        )));
    }

    // Read first bytes for magic number detection
    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 16];
    let bytes_read = file.read(&mut header)?;

    match &header[..bytes_read.min(8)] {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => Ok(DocumentFormat::Pdf),
        // ZIP signature: DOCX/XLSX/PPTX are all ZIP containers, so the
        // extension disambiguates within the OOXML family.
        [0x50, 0x4B, 0x03, 0x04, ..] => match extension(path) {
            Some(DocumentFormat::Docx) => Ok(DocumentFormat::Docx),
            Some(DocumentFormat::Xlsx) => Ok(DocumentFormat::Xlsx),
            Some(DocumentFormat::Pptx) => Ok(DocumentFormat::Pptx),
            _ => Err(PipelineError::Validation(format!(
                "Unrecognized ZIP container: {}",
                path.display()
            ))),
        },
        _ => {
            if is_likely_text(path)? {
                match extension(path) {
                    Some(DocumentFormat::Csv) => Ok(DocumentFormat::Csv),
                    _ => Ok(DocumentFormat::Txt),
                }
            } else {
                Err(PipelineError::Validation(format!(
                    "Unsupported format: {}",
                    path.display()
                )))
            }
        }
    }
}

fn extension(path: &Path) -> Option<DocumentFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
}

/// Check if a file is likely plain text (valid UTF-8, mostly printable).
fn is_likely_text(path: &Path) -> Result<bool, PipelineError> {
    let mut file = std::fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let n = file.read(&mut buffer)?;
    buffer.truncate(n);

    if n == 0 {
        return Ok(false);
    }

    // A sample may end mid-codepoint; only the valid prefix matters.
    let text = match std::str::from_utf8(&buffer) {
        Ok(t) => t,
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&buffer[..e.valid_up_to()]) {
            Ok(t) => t,
            Err(_) => return Ok(false),
        },
        Err(_) => return Ok(false),
    };

    if text.is_empty() {
        return Ok(false);
    }

    // At least 80% printable characters (or whitespace)
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    let ratio = printable as f64 / text.chars().count().max(1) as f64;
    Ok(ratio > 0.80)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_pdf_from_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4 some content").unwrap();
        assert_eq!(detect_format(&path).unwrap(), DocumentFormat::Pdf);
    }

    #[test]
    fn wrong_extension_overridden_by_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        // PDF content with .txt extension
        let path = dir.path().join("misleading.txt");
        std::fs::write(&path, b"%PDF-1.7 content").unwrap();
        assert_eq!(detect_format(&path).unwrap(), DocumentFormat::Pdf);
    }

    #[test]
    fn zip_container_disambiguated_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for (name, expected) in [
            ("report.docx", DocumentFormat::Docx),
            ("sheet.xlsx", DocumentFormat::Xlsx),
            ("deck.pptx", DocumentFormat::Pptx),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00]).unwrap();
            assert_eq!(detect_format(&path).unwrap(), expected, "for {name}");
        }
    }

    #[test]
    fn unknown_zip_container_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, [0x50, 0x4B, 0x03, 0x04]).unwrap();
        assert!(matches!(
            detect_format(&path),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn detect_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Quarterly review notes.\n\nRevenue grew 12%.").unwrap();
        assert_eq!(detect_format(&path).unwrap(), DocumentFormat::Txt);
    }

    #[test]
    fn detect_csv_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "name,amount\nwidget,42\n").unwrap();
        assert_eq!(detect_format(&path).unwrap(), DocumentFormat::Csv);
    }

    #[test]
    fn empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            detect_format(&path),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn missing_file_rejected() {
        let result = detect_format(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn binary_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0xFF, 0xFE]).unwrap();
        assert!(matches!(
            detect_format(&path),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.bin");
        // Sparse file just over the limit
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();
        assert!(matches!(
            detect_format(&path),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn format_roundtrip() {
        for format in DocumentFormat::all() {
            assert_eq!(
                DocumentFormat::from_extension(format.as_str()),
                Some(*format)
            );
        }
    }

    #[test]
    fn format_display() {
        assert_eq!(DocumentFormat::Docx.to_string(), "docx");
        assert_eq!(DocumentFormat::Csv.to_string(), "csv");
    }
}
