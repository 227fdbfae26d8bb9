//! Token-bounded chunk splitting.
//!
//! Greedy accumulation of fragments under a token budget, carrying the
//! current heading breadcrumb into every chunk. A single fragment that
//! exceeds the budget on its own is emitted whole and flagged; it cannot be
//! split further at this layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Fragment, FragmentKind};

/// Tokens-per-word heuristic, not an exact tokenizer: word count × 1.3,
/// rounded up.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count() as u32;
    (words * 13).div_ceil(10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum estimated tokens per chunk.
    pub max_tokens: u32,
    /// Prefix each chunk with its heading breadcrumb.
    pub include_breadcrumbs: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            include_breadcrumbs: true,
        }
    }
}

/// One rendered chunk. The first chunk of a split is the primary output;
/// the rest are auxiliary (their destination is a formatter concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Heading context captured when the chunk was opened, outermost first.
    pub breadcrumb: Vec<String>,
    /// Estimated tokens of the fragment text (breadcrumb prefix excluded).
    pub token_estimate: u32,
    pub fragment_count: usize,
    /// True when a single fragment exceeded the budget and was emitted whole.
    pub oversized: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChunkSplitter {
    config: ChunkConfig,
}

impl ChunkSplitter {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Split a fragment sequence into ordered chunks. The budget applies to
    /// fragment text; every chunk stays within it except oversized singles.
    pub fn split(&self, fragments: &[Fragment]) -> Vec<Chunk> {
        let budget = self.config.max_tokens.max(1);
        let mut chunks = Vec::new();

        // Running heading context by level, updated as headings pass by.
        let mut open_headings: BTreeMap<u32, String> = BTreeMap::new();

        let mut current: Vec<&Fragment> = Vec::new();
        let mut current_tokens = 0u32;
        let mut current_crumb: Vec<String> = Vec::new();

        for frag in fragments.iter().filter(|f| !f.is_empty()) {
            if frag.kind == FragmentKind::Heading {
                let level = frag.level.unwrap_or(1).max(1);
                open_headings.split_off(&level);
                // Snapshot below happens before the heading registers itself,
                // so a chunk opened by a heading lists only its ancestors.
                let tokens = estimate_tokens(&frag.text);
                self.place(
                    frag,
                    tokens,
                    budget,
                    &open_headings,
                    &mut current,
                    &mut current_tokens,
                    &mut current_crumb,
                    &mut chunks,
                );
                open_headings.insert(level, frag.text.clone());
            } else {
                let tokens = estimate_tokens(&frag.text);
                self.place(
                    frag,
                    tokens,
                    budget,
                    &open_headings,
                    &mut current,
                    &mut current_tokens,
                    &mut current_crumb,
                    &mut chunks,
                );
            }
        }

        if !current.is_empty() {
            chunks.push(self.render(&current, current_tokens, current_crumb, false));
        }

        chunks
    }

    #[allow(clippy::too_many_arguments)]
    fn place<'a>(
        &self,
        frag: &'a Fragment,
        tokens: u32,
        budget: u32,
        open_headings: &BTreeMap<u32, String>,
        current: &mut Vec<&'a Fragment>,
        current_tokens: &mut u32,
        current_crumb: &mut Vec<String>,
        chunks: &mut Vec<Chunk>,
    ) {
        if tokens > budget {
            // Unsplittable: close the running chunk, emit this one alone.
            if !current.is_empty() {
                chunks.push(self.render(current, *current_tokens, std::mem::take(current_crumb), false));
                current.clear();
                *current_tokens = 0;
            }
            let crumb = open_headings.values().cloned().collect();
            chunks.push(self.render(&[frag], tokens, crumb, true));
            return;
        }

        if !current.is_empty() && *current_tokens + tokens > budget {
            chunks.push(self.render(current, *current_tokens, std::mem::take(current_crumb), false));
            current.clear();
            *current_tokens = 0;
        }

        if current.is_empty() {
            *current_crumb = open_headings.values().cloned().collect();
        }
        current.push(frag);
        *current_tokens += tokens;
    }

    fn render(
        &self,
        fragments: &[&Fragment],
        token_estimate: u32,
        breadcrumb: Vec<String>,
        oversized: bool,
    ) -> Chunk {
        let body = fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let content = if self.config.include_breadcrumbs && !breadcrumb.is_empty() {
            format!("{}\n\n{body}", breadcrumb.join(" > "))
        } else {
            body
        };

        Chunk {
            content,
            breadcrumb,
            token_estimate,
            fragment_count: fragments.len(),
            oversized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 15 words → ceil(15 × 1.3) = 20 estimated tokens.
    fn twenty_token_para() -> Fragment {
        Fragment::new(
            FragmentKind::Paragraph,
            "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron",
        )
    }

    fn splitter(max_tokens: u32) -> ChunkSplitter {
        ChunkSplitter::new(ChunkConfig {
            max_tokens,
            include_breadcrumbs: true,
        })
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens("one two three"), 4); // 3.9 → 4
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("word"), 2); // 1.3 → 2
    }

    #[test]
    fn ten_fragments_fifty_budget_gives_five_chunks() {
        let frags: Vec<Fragment> = (0..10).map(|_| twenty_token_para()).collect();
        let chunks = splitter(50).split(&frags);

        assert_eq!(chunks.len(), 5);
        for chunk in &chunks {
            assert_eq!(chunk.fragment_count, 2);
            assert_eq!(chunk.token_estimate, 40);
            assert!(chunk.token_estimate <= 50);
            assert!(!chunk.oversized);
        }
    }

    #[test]
    fn everything_fits_in_one_chunk() {
        let frags = vec![twenty_token_para(), twenty_token_para()];
        let chunks = splitter(512).split(&frags);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].fragment_count, 2);
    }

    #[test]
    fn oversized_fragment_emitted_alone_and_flagged() {
        let huge_text = (0..500).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let frags = vec![
            twenty_token_para(),
            Fragment::new(FragmentKind::Paragraph, huge_text),
            twenty_token_para(),
        ];
        let chunks = splitter(50).split(&frags);

        assert_eq!(chunks.len(), 3);
        assert!(!chunks[0].oversized);
        assert!(chunks[1].oversized);
        assert_eq!(chunks[1].fragment_count, 1);
        assert!(chunks[1].token_estimate > 50);
        assert!(!chunks[2].oversized);
    }

    #[test]
    fn breadcrumb_prefixes_chunk_content() {
        let frags = vec![
            Fragment::heading("Report", 1),
            Fragment::heading("Findings", 2),
            Fragment::new(FragmentKind::Paragraph, "Detail text."),
        ];
        let chunks = splitter(512).split(&frags);
        assert_eq!(chunks.len(), 1);
        // Chunk opened by the level-1 heading: no ancestors yet
        assert!(chunks[0].breadcrumb.is_empty());
        assert!(chunks[0].content.contains("Report"));
        assert!(chunks[0].content.contains("Detail text."));
    }

    #[test]
    fn later_chunks_carry_heading_context() {
        let mut frags = vec![Fragment::heading("Chapter One", 1)];
        for _ in 0..4 {
            frags.push(twenty_token_para());
        }
        let chunks = splitter(50).split(&frags);

        assert!(chunks.len() >= 2);
        // A chunk opened after the heading passed carries it as context
        let last = chunks.last().unwrap();
        assert_eq!(last.breadcrumb, vec!["Chapter One".to_string()]);
        assert!(last.content.starts_with("Chapter One\n\n"));
    }

    #[test]
    fn new_top_heading_replaces_breadcrumb() {
        let frags = vec![
            Fragment::heading("One", 1),
            twenty_token_para(),
            twenty_token_para(),
            Fragment::heading("Two", 1),
            twenty_token_para(),
            twenty_token_para(),
            twenty_token_para(),
        ];
        let chunks = splitter(50).split(&frags);
        // The final chunk opens after "Two" passed, so it carries it alone
        let last = chunks.last().unwrap();
        assert_eq!(last.breadcrumb, vec!["Two".to_string()]);
    }

    #[test]
    fn breadcrumbs_can_be_disabled() {
        let frags = vec![
            Fragment::heading("Title", 1),
            twenty_token_para(),
            twenty_token_para(),
            twenty_token_para(),
        ];
        let chunks = ChunkSplitter::new(ChunkConfig {
            max_tokens: 50,
            include_breadcrumbs: false,
        })
        .split(&frags);
        for chunk in &chunks[1..] {
            assert!(!chunk.content.starts_with("Title\n\n"));
        }
    }

    #[test]
    fn empty_fragments_are_skipped() {
        let frags = vec![
            Fragment::new(FragmentKind::Paragraph, ""),
            twenty_token_para(),
            Fragment::new(FragmentKind::Paragraph, "   "),
        ];
        let chunks = splitter(512).split(&frags);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].fragment_count, 1);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(splitter(512).split(&[]).is_empty());
    }

    #[test]
    fn budget_respected_for_uneven_sizes() {
        let frags: Vec<Fragment> = (1..=8)
            .map(|n| {
                let text = (0..n * 3).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
                Fragment::new(FragmentKind::Paragraph, text)
            })
            .collect();
        let budget = 25;
        let chunks = splitter(budget).split(&frags);

        let total: usize = chunks.iter().map(|c| c.fragment_count).sum();
        assert_eq!(total, frags.len());
        for chunk in &chunks {
            assert!(chunk.oversized || chunk.token_estimate <= budget);
        }
    }
}
