//! Document statistics enrichment.
//!
//! Runs after hierarchy linking so depth figures are meaningful. Writes
//! per-kind counts and totals into the stage metadata for downstream
//! formatters and callers.

use std::collections::BTreeMap;

use super::error::PipelineError;
use super::hierarchy;
use super::traits::EnrichmentStep;
use super::types::EnrichedOutcome;

pub const STEP_NAME: &str = "statistics";

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsStep;

impl StatisticsStep {
    pub fn new() -> Self {
        Self
    }
}

impl EnrichmentStep for StatisticsStep {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![hierarchy::STEP_NAME.to_string()]
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn process(&self, outcome: &EnrichedOutcome) -> Result<EnrichedOutcome, PipelineError> {
        let mut kind_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for frag in &outcome.fragments {
            *kind_counts.entry(frag.kind.as_str()).or_insert(0) += 1;
        }

        let word_count: usize = outcome.fragments.iter().map(|f| f.word_count()).sum();
        let char_count: usize = outcome.fragments.iter().map(|f| f.text.chars().count()).sum();
        let max_depth = outcome.fragments.iter().map(|f| f.depth).max().unwrap_or(0);

        let mut next = outcome.clone();
        next.stage_metadata.insert(
            STEP_NAME.to_string(),
            serde_json::json!({
                "fragment_count": outcome.fragments.len(),
                "kind_counts": kind_counts,
                "word_count": word_count,
                "char_count": char_count,
                "max_depth": max_depth,
            }),
        );
        Ok(next)
    }
}
