//! CSV extractor.
//!
//! Naive comma splitting — quoted fields with embedded delimiters need a
//! real CSV parser registered externally. The header row is recorded in each
//! row fragment's metadata; every data row becomes one table fragment.

use std::path::Path;

use crate::pipeline::import::{compute_source_hash, DocumentFormat};
use crate::pipeline::traits::Extractor;
use crate::pipeline::types::{
    DocumentMetadata, ExtractionOutcome, Fragment, FragmentKind, FragmentPosition,
};

use super::PLAIN_TEXT_CONFIDENCE;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

impl CsvExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for CsvExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Csv
    }

    fn extract(&self, path: &Path) -> ExtractionOutcome {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                return ExtractionOutcome::failed(format!(
                    "Cannot read {}: {e}",
                    path.display()
                ))
            }
        };

        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return ExtractionOutcome::failed(format!("No rows in {}", path.display()));
        };
        let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

        let mut fragments = Vec::new();
        let mut warnings = Vec::new();
        for (i, line) in lines.enumerate() {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != headers.len() {
                warnings.push(format!(
                    "Row {} has {} cell(s), expected {}",
                    i + 1,
                    cells.len(),
                    headers.len()
                ));
            }
            let text = headers
                .iter()
                .zip(&cells)
                .map(|(h, c)| format!("{h}: {c}"))
                .collect::<Vec<_>>()
                .join(" | ");
            fragments.push(
                Fragment::new(FragmentKind::Table, text)
                    .with_confidence(PLAIN_TEXT_CONFIDENCE)
                    .with_metadata("row", serde_json::json!(i + 1))
                    .with_metadata("columns", serde_json::json!(headers))
                    .with_position(FragmentPosition {
                        sequence: Some(i as u32),
                        ..Default::default()
                    }),
            );
        }

        let metadata = DocumentMetadata {
            word_count: content.split_whitespace().count(),
            char_count: content.chars().count(),
            source_hash: compute_source_hash(path).ok(),
            ..Default::default()
        };

        tracing::debug!(
            path = %path.display(),
            rows = fragments.len(),
            columns = headers.len(),
            "CSV extraction complete"
        );
        let mut outcome = ExtractionOutcome::ok(fragments, metadata);
        outcome.warnings = warnings;
        outcome
    }
}
