//! Markdown formatter.
//!
//! Renders headings from their linked depth, so documents with skipped or
//! missing levels still produce a sensible outline.

use crate::pipeline::traits::Formatter;
use crate::pipeline::types::{EnrichedOutcome, Fragment, FragmentKind, FormattedOutput};

pub const FORMAT_NAME: &str = "markdown";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self
    }

    fn render_fragment(frag: &Fragment) -> String {
        match frag.kind {
            FragmentKind::Heading => {
                let depth = (frag.depth as usize + 1).min(6);
                format!("{} {}", "#".repeat(depth), frag.text)
            }
            FragmentKind::ListItem => format!("- {}", frag.text),
            FragmentKind::Quote => frag
                .text
                .lines()
                .map(|l| format!("> {l}"))
                .collect::<Vec<_>>()
                .join("\n"),
            FragmentKind::Code => format!("```\n{}\n```", frag.text),
            FragmentKind::Image => format!("![{}]", frag.text),
            FragmentKind::Paragraph | FragmentKind::Table => frag.text.clone(),
        }
    }
}

impl Formatter for MarkdownFormatter {
    fn name(&self) -> &str {
        FORMAT_NAME
    }

    fn format(&self, outcome: &EnrichedOutcome) -> FormattedOutput {
        let mut blocks = Vec::new();
        if let Some(title) = &outcome.metadata.title {
            // Avoid duplicating a title the extractor already emitted as the
            // first heading.
            let first_heading_matches = outcome
                .fragments
                .iter()
                .find(|f| f.kind == FragmentKind::Heading)
                .is_some_and(|f| &f.text == title);
            if !first_heading_matches {
                blocks.push(format!("# {title}"));
            }
        }

        for frag in outcome.fragments.iter().filter(|f| !f.is_empty()) {
            blocks.push(Self::render_fragment(frag));
        }

        FormattedOutput::ok(FORMAT_NAME, blocks.join("\n\n"))
    }
}
