//! Chunk formatter — token-bounded output for retrieval pipelines.
//!
//! The first chunk is the primary content; overflow chunks become numbered
//! auxiliary parts for the caller to write wherever it wants.

use crate::pipeline::chunker::{ChunkConfig, ChunkSplitter};
use crate::pipeline::traits::Formatter;
use crate::pipeline::types::{AuxiliaryPart, EnrichedOutcome, FormattedOutput};

pub const FORMAT_NAME: &str = "chunks";

#[derive(Debug, Clone, Default)]
pub struct ChunkFormatter {
    splitter: ChunkSplitter,
}

impl ChunkFormatter {
    pub fn new(config: ChunkConfig) -> Self {
        Self {
            splitter: ChunkSplitter::new(config),
        }
    }
}

impl Formatter for ChunkFormatter {
    fn name(&self) -> &str {
        FORMAT_NAME
    }

    fn format(&self, outcome: &EnrichedOutcome) -> FormattedOutput {
        let chunks = self.splitter.split(&outcome.fragments);

        let Some((primary, rest)) = chunks.split_first() else {
            let mut output = FormattedOutput::ok(FORMAT_NAME, String::new());
            output.warnings.push("no content to chunk".to_string());
            return output;
        };

        let mut output = FormattedOutput::ok(FORMAT_NAME, primary.content.clone());
        output.aux_parts = rest
            .iter()
            .enumerate()
            .map(|(i, chunk)| AuxiliaryPart {
                file_name: format!("chunk_{:03}.txt", i + 2),
                content: chunk.content.clone(),
            })
            .collect();
        if primary.oversized || rest.iter().any(|c| c.oversized) {
            output
                .warnings
                .push("one or more chunks exceed the token budget".to_string());
        }
        output
    }
}
