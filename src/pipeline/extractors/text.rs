//! Plain-text extractor.
//!
//! Splits on blank lines into blocks; recognizes Markdown-style headings
//! (`#` prefix), list items (`-`/`*` prefix), and quotes (`>` prefix).
//! Everything else is a paragraph.

use std::path::Path;

use crate::pipeline::import::{compute_source_hash, DocumentFormat};
use crate::pipeline::traits::Extractor;
use crate::pipeline::types::{
    DocumentMetadata, ExtractionOutcome, Fragment, FragmentKind, FragmentPosition,
};

use super::PLAIN_TEXT_CONFIDENCE;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_block(block: &str) -> Vec<Fragment> {
        let trimmed = block.trim();

        if let Some(rest) = trimmed.strip_prefix('#') {
            let extra = rest.chars().take_while(|&c| c == '#').count();
            let level = (1 + extra).min(6) as u32;
            let text = rest[extra..].trim_start();
            if !text.is_empty() {
                return vec![Fragment::heading(text, level)
                    .with_confidence(PLAIN_TEXT_CONFIDENCE)];
            }
        }

        if trimmed
            .lines()
            .all(|l| l.trim_start().starts_with("- ") || l.trim_start().starts_with("* "))
        {
            return trimmed
                .lines()
                .map(|l| {
                    let item = l.trim_start()[2..].trim();
                    Fragment::new(FragmentKind::ListItem, item)
                        .with_confidence(PLAIN_TEXT_CONFIDENCE)
                })
                .collect();
        }

        if trimmed.lines().all(|l| l.trim_start().starts_with('>')) {
            let quote = trimmed
                .lines()
                .map(|l| l.trim_start().trim_start_matches('>').trim_start())
                .collect::<Vec<_>>()
                .join("\n");
            return vec![Fragment::new(FragmentKind::Quote, quote)
                .with_confidence(PLAIN_TEXT_CONFIDENCE)];
        }

        vec![Fragment::new(FragmentKind::Paragraph, trimmed)
            .with_confidence(PLAIN_TEXT_CONFIDENCE)]
    }
}

impl Extractor for TextExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Txt
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

        let mut fragments = Vec::new();
        for block in content.split("\n\n").filter(|b| !b.trim().is_empty()) {
            fragments.extend(Self::parse_block(block));
        }
        for (i, frag) in fragments.iter_mut().enumerate() {
            frag.position = Some(FragmentPosition {
                sequence: Some(i as u32),
                ..Default::default()
            });
        }

        let title = fragments
            .iter()
            .find(|f| f.kind == FragmentKind::Heading)
            .map(|f| f.text.clone());
        let metadata = DocumentMetadata {
            title,
            word_count: content.split_whitespace().count(),
            char_count: content.chars().count(),
            source_hash: compute_source_hash(path).ok(),
            ..Default::default()
        };

        tracing::debug!(
            path = %path.display(),
            fragments = fragments.len(),
            "Text extraction complete"
        );
        ExtractionOutcome::ok(fragments, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_str(content: &str) -> ExtractionOutcome {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, content).unwrap();
        TextExtractor::new().extract(&path)
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let outcome = extract_str("First paragraph.\n\nSecond paragraph.");
        assert!(outcome.success);
        assert_eq!(outcome.fragments.len(), 2);
        assert!(outcome
            .fragments
            .iter()
            .all(|f| f.kind == FragmentKind::Paragraph));
    }

    #[test]
    fn hash_headings_with_levels() {
        let outcome = extract_str("# Title\n\n## Section\n\nBody text.");
        assert_eq!(outcome.fragments[0].kind, FragmentKind::Heading);
        assert_eq!(outcome.fragments[0].level, Some(1));
        assert_eq!(outcome.fragments[0].text, "Title");
        assert_eq!(outcome.fragments[1].level, Some(2));
        assert_eq!(outcome.fragments[2].kind, FragmentKind::Paragraph);
    }

    #[test]
    fn list_blocks_become_items() {
        let outcome = extract_str("- first\n- second\n* third");
        assert_eq!(outcome.fragments.len(), 3);
        assert!(outcome
            .fragments
            .iter()
            .all(|f| f.kind == FragmentKind::ListItem));
        assert_eq!(outcome.fragments[0].text, "first");
        assert_eq!(outcome.fragments[2].text, "third");
    }

    #[test]
    fn quote_blocks_joined() {
        let outcome = extract_str("> quoted line one\n> quoted line two");
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(outcome.fragments[0].kind, FragmentKind::Quote);
        assert_eq!(outcome.fragments[0].text, "quoted line one\nquoted line two");
    }

    #[test]
    fn metadata_counts_and_hash() {
        let outcome = extract_str("# Title\n\ntwo words");
        assert_eq!(outcome.metadata.title, Some("Title".to_string()));
        assert_eq!(outcome.metadata.word_count, 4);
        assert!(outcome.metadata.source_hash.is_some());
    }

    #[test]
    fn fragments_carry_sequence_positions() {
        let outcome = extract_str("a\n\nb\n\nc");
        let sequences: Vec<Option<u32>> = outcome
            .fragments
            .iter()
            .map(|f| f.position.as_ref().and_then(|p| p.sequence))
            .collect();
        assert_eq!(sequences, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn all_fragments_high_confidence() {
        let outcome = extract_str("# T\n\nbody");
        assert!(outcome
            .fragments
            .iter()
            .all(|f| f.confidence == Some(PLAIN_TEXT_CONFIDENCE)));
    }

    #[test]
    fn missing_file_fails_via_outcome() {
        let outcome = TextExtractor::new().extract(Path::new("/nonexistent/doc.txt"));
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1);
    }
}
