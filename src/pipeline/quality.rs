//! Extraction quality scoring.
//!
//! Three independent sub-scores (completeness, consistency, readability) and
//! their arithmetic mean, each in [0,100], plus human-readable issues. An
//! aggregate below the review threshold flags the document for review.

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::traits::EnrichmentStep;
use super::types::{EnrichedOutcome, Fragment, FragmentKind};

/// Step name other steps reference in their dependencies.
pub const STEP_NAME: &str = "quality";

/// Default thresholds used by the scorer.
pub mod thresholds {
    /// Fragments below this confidence count against consistency.
    pub const LOW_CONFIDENCE: f32 = 0.5;

    /// Aggregate scores below this flag the document for review.
    pub const NEEDS_REVIEW: f32 = 60.0;

    /// Symbol-to-character ratio above which a fragment reads as noise.
    pub const SYMBOL_RATIO: f64 = 0.5;

    /// Tokens longer than this suggest extraction artifacts (no word breaks).
    pub const MAX_TOKEN_LEN: usize = 30;
}

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Completeness penalty per empty-content fragment.
    pub empty_fragment_penalty: f32,
    /// Confidence below which a fragment counts as low-confidence (0.0-1.0).
    pub low_confidence_threshold: f32,
    /// Aggregate score below which the document needs review (0-100).
    pub review_threshold: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            empty_fragment_penalty: 10.0,
            low_confidence_threshold: thresholds::LOW_CONFIDENCE,
            review_threshold: thresholds::NEEDS_REVIEW,
        }
    }
}

/// Full scoring result for one fragment sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub completeness: f32,
    pub consistency: f32,
    pub readability: f32,
    pub aggregate: f32,
    pub issues: Vec<String>,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, fragments: &[Fragment]) -> QualityReport {
        if fragments.is_empty() {
            return QualityReport {
                completeness: 0.0,
                consistency: 0.0,
                readability: 0.0,
                aggregate: 0.0,
                issues: vec!["empty document".to_string()],
                needs_review: true,
            };
        }

        let mut issues = Vec::new();
        let completeness = self.score_completeness(fragments, &mut issues);
        let consistency = self.score_consistency(fragments, &mut issues);
        let readability = self.score_readability(fragments, &mut issues);
        let aggregate = (completeness + consistency + readability) / 3.0;

        QualityReport {
            completeness,
            consistency,
            readability,
            aggregate,
            issues,
            needs_review: aggregate < self.config.review_threshold,
        }
    }

    fn score_completeness(&self, fragments: &[Fragment], issues: &mut Vec<String>) -> f32 {
        let mut score = 100.0;

        let empty_count = fragments.iter().filter(|f| f.is_empty()).count();
        if empty_count > 0 {
            score -= empty_count as f32 * self.config.empty_fragment_penalty;
            issues.push(format!("{empty_count} empty fragment(s)"));
        }

        if !fragments.iter().any(|f| f.kind == FragmentKind::Heading) {
            score -= 20.0;
            issues.push("no headings found".to_string());
        }

        let distinct_kinds = {
            let mut kinds: Vec<FragmentKind> = fragments.iter().map(|f| f.kind).collect();
            kinds.sort_by_key(|k| k.as_str());
            kinds.dedup();
            kinds.len()
        };
        if distinct_kinds >= 3 {
            score += 10.0;
        }

        score.clamp(0.0, 100.0)
    }

    fn score_consistency(&self, fragments: &[Fragment], issues: &mut Vec<String>) -> f32 {
        let mut score = 100.0;

        let missing = fragments.iter().filter(|f| f.confidence.is_none()).count();
        if missing > 0 {
            score -= missing as f32 * 5.0;
            issues.push(format!("{missing} fragment(s) without confidence"));
        }

        let low = fragments
            .iter()
            .filter(|f| {
                f.confidence
                    .is_some_and(|c| c < self.config.low_confidence_threshold)
            })
            .count();
        if low > 0 {
            score -= low as f32 * 3.0;
            issues.push(format!("{low} low-confidence fragment(s)"));
        }

        score.clamp(0.0, 100.0)
    }

    fn score_readability(&self, fragments: &[Fragment], issues: &mut Vec<String>) -> f32 {
        let mut score: f32 = 100.0;
        let mut noisy = 0usize;
        let mut long_tokens = 0usize;

        for frag in fragments.iter().filter(|f| !f.is_empty()) {
            let total = frag.text.chars().count();
            let symbols = frag
                .text
                .chars()
                .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
                .count();
            if symbols as f64 / total.max(1) as f64 > thresholds::SYMBOL_RATIO {
                score -= 10.0;
                noisy += 1;
            }

            if frag
                .text
                .split_whitespace()
                .any(|token| token.chars().count() > thresholds::MAX_TOKEN_LEN)
            {
                score -= 5.0;
                long_tokens += 1;
            }
        }

        if noisy > 0 {
            issues.push(format!("{noisy} fragment(s) with high symbol density"));
        }
        if long_tokens > 0 {
            issues.push(format!("{long_tokens} fragment(s) with overlong tokens"));
        }

        score.clamp(0.0, 100.0)
    }
}

impl EnrichmentStep for QualityScorer {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn process(&self, outcome: &EnrichedOutcome) -> Result<EnrichedOutcome, PipelineError> {
        let report = self.score(&outcome.fragments);
        tracing::debug!(
            aggregate = report.aggregate,
            needs_review = report.needs_review,
            issues = report.issues.len(),
            "Quality scored"
        );

        let mut next = outcome.clone();
        next.quality_score = Some(report.aggregate);
        next.quality_issues = report.issues.clone();
        next.needs_review = report.needs_review;
        next.stage_metadata.insert(
            STEP_NAME.to_string(),
            serde_json::json!({
                "completeness": report.completeness,
                "consistency": report.consistency,
                "readability": report.readability,
                "aggregate": report.aggregate,
            }),
        );
        Ok(next)
    }
}
