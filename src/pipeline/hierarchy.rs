//! Heading hierarchy linking.
//!
//! Single left-to-right pass over the fragment sequence, maintaining a map
//! from heading level to the most recent open heading at that level. Every
//! fragment gains a parent reference, a depth, and its document path
//! (ancestor heading texts, outermost first). No backtracking.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::error::PipelineError;
use super::traits::EnrichmentStep;
use super::types::{EnrichedOutcome, Fragment, FragmentKind};

/// Step name other steps reference in their dependencies.
pub const STEP_NAME: &str = "hierarchy";

#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyLinker;

impl HierarchyLinker {
    pub fn new() -> Self {
        Self
    }

    /// Link a fragment sequence. Output has the same length and identity set
    /// as the input; only parent/depth/path are rewritten.
    pub fn link(&self, fragments: &[Fragment]) -> Vec<Fragment> {
        // Open headings by level. BTreeMap keeps ascending-level iteration
        // for path construction.
        let mut open: BTreeMap<u32, (Uuid, String)> = BTreeMap::new();
        let mut linked = Vec::with_capacity(fragments.len());

        for frag in fragments {
            if frag.kind == FragmentKind::Heading {
                // A heading without explicit level metadata is a top-level one.
                let level = frag.level.unwrap_or(1).max(1);

                let parent = open.range(..level).next_back().map(|(_, (id, _))| *id);
                let path: Vec<String> = open
                    .range(..level)
                    .map(|(_, (_, text))| text.clone())
                    .collect();

                // Levels at or below this heading are closed by it.
                open.split_off(&level);

                linked.push(frag.with_hierarchy(parent, level - 1, path));
                open.insert(level, (frag.id, frag.text.clone()));
            } else {
                let (parent, depth) = match open.iter().next_back() {
                    Some((&level, (id, _))) => (Some(*id), level),
                    None => (None, 0),
                };
                let path: Vec<String> = open.values().map(|(_, text)| text.clone()).collect();
                linked.push(frag.with_hierarchy(parent, depth, path));
            }
        }

        linked
    }
}

impl EnrichmentStep for HierarchyLinker {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn process(&self, outcome: &EnrichedOutcome) -> Result<EnrichedOutcome, PipelineError> {
        let linked = self.link(&outcome.fragments);

        let root_count = linked.iter().filter(|f| f.parent.is_none()).count();
        let max_depth = linked.iter().map(|f| f.depth).max().unwrap_or(0);
        tracing::debug!(
            fragments = linked.len(),
            roots = root_count,
            max_depth,
            "Hierarchy linked"
        );

        let mut next = outcome.clone();
        next.fragments = linked;
        next.stage_metadata.insert(
            STEP_NAME.to_string(),
            serde_json::json!({ "roots": root_count, "max_depth": max_depth }),
        );
        Ok(next)
    }
}
