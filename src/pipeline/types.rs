//! Core types for the document processing pipeline.
//!
//! These types model the full lifecycle:
//! File → Extraction → Enrichment → Formatting → FileResult.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════
// Fragment Kind
// ═══════════════════════════════════════════

/// The typed content categories an extractor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Heading,
    Paragraph,
    ListItem,
    Quote,
    Code,
    Table,
    Image,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::ListItem => "list_item",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::Table => "table",
            Self::Image => "image",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "heading" => Some(Self::Heading),
            "paragraph" => Some(Self::Paragraph),
            "list_item" => Some(Self::ListItem),
            "quote" => Some(Self::Quote),
            "code" => Some(Self::Code),
            "table" => Some(Self::Table),
            "image" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn all() -> &'static [FragmentKind] {
        &[
            Self::Heading,
            Self::Paragraph,
            Self::ListItem,
            Self::Quote,
            Self::Code,
            Self::Table,
            Self::Image,
        ]
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Fragment
// ═══════════════════════════════════════════

/// Where a fragment came from within its source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Zero-based index within the extraction sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

/// An atomic typed piece of extracted content.
///
/// Fragments are produced once by an extractor and never mutated; enrichment
/// steps build *new* fragments via [`Fragment::with_hierarchy`], preserving
/// the original identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: Uuid,
    pub kind: FragmentKind,
    pub text: String,
    /// Unstripped source text, when it differs from `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    /// Heading level (1 = top). Only meaningful for headings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<FragmentPosition>,
    /// Weak back-reference to an earlier fragment in the same sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Extraction confidence (0.0-1.0), when the extractor reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Nesting depth assigned by hierarchy linking (0 = root).
    #[serde(default)]
    pub depth: u32,
    /// Ancestor heading texts, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Fragment {
    pub fn new(kind: FragmentKind, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            text: text.into(),
            raw_text: None,
            level: None,
            position: None,
            parent: None,
            related: Vec::new(),
            metadata: BTreeMap::new(),
            confidence: None,
            depth: 0,
            path: Vec::new(),
        }
    }

    pub fn heading(text: impl Into<String>, level: u32) -> Self {
        Self::new(FragmentKind::Heading, text).with_level(level)
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_position(mut self, position: FragmentPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Copy of this fragment with hierarchy fields set. Identity and all
    /// other fields are preserved.
    pub fn with_hierarchy(&self, parent: Option<Uuid>, depth: u32, path: Vec<String>) -> Self {
        let mut next = self.clone();
        next.parent = parent;
        next.depth = depth;
        next.path = path;
        next
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

// ═══════════════════════════════════════════
// Document Metadata
// ═══════════════════════════════════════════

/// Document-level metadata reported by the extractor and completed by the
/// orchestrator (counts, source hash).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    pub word_count: usize,
    pub char_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// SHA-256 of the source file, base64-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

// ═══════════════════════════════════════════
// Outcomes
// ═══════════════════════════════════════════

/// Raw, un-enriched output of a format-specific extractor for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub fragments: Vec<Fragment>,
    pub metadata: DocumentMetadata,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ExtractionOutcome {
    pub fn ok(fragments: Vec<Fragment>, metadata: DocumentMetadata) -> Self {
        Self {
            fragments,
            metadata,
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            fragments: Vec::new(),
            metadata: DocumentMetadata::default(),
            success: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

/// Extraction output plus everything the enrichment steps layered on.
///
/// Each step consumes the previous EnrichedOutcome and returns a new one;
/// steps never mutate their input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedOutcome {
    pub fragments: Vec<Fragment>,
    pub metadata: DocumentMetadata,
    /// Per-step metadata, keyed by step name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_metadata: BTreeMap<String, serde_json::Value>,
    /// Aggregate quality score (0-100), set by the quality step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_issues: Vec<String>,
    #[serde(default)]
    pub needs_review: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl EnrichedOutcome {
    /// No-op wrapper around an extraction outcome, used when zero enrichment
    /// steps are registered and as the seed for the first step.
    pub fn from_extraction(extraction: &ExtractionOutcome) -> Self {
        Self {
            fragments: extraction.fragments.clone(),
            metadata: extraction.metadata.clone(),
            stage_metadata: BTreeMap::new(),
            quality_score: None,
            quality_issues: Vec::new(),
            needs_review: false,
            errors: extraction.errors.clone(),
            warnings: extraction.warnings.clone(),
        }
    }
}

// ═══════════════════════════════════════════
// Formatted Output
// ═══════════════════════════════════════════

/// A secondary rendered part for multi-chunk output (e.g., overflow chunks).
/// The eventual on-disk destination is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuxiliaryPart {
    pub file_name: String,
    pub content: String,
}

/// Rendered output of one formatter for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedOutput {
    pub format: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aux_parts: Vec<AuxiliaryPart>,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl FormattedOutput {
    pub fn ok(format: impl Into<String>, content: String) -> Self {
        Self {
            format: format.into(),
            content,
            aux_parts: Vec::new(),
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failed(format: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            content: String::new(),
            aux_parts: Vec::new(),
            success: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════
// Pipeline Stage
// ═══════════════════════════════════════════

/// The stages a file moves through. Recorded in FileResult when a stage
/// fails fatally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Extracting,
    Enriching,
    Formatting,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Enriching => "enriching",
            Self::Formatting => "formatting",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "validating" => Some(Self::Validating),
            "extracting" => Some(Self::Extracting),
            "enriching" => Some(Self::Enriching),
            "formatting" => Some(Self::Formatting),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// File Result
// ═══════════════════════════════════════════

/// The aggregate, terminal outcome of running one file through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub extraction: Option<ExtractionOutcome>,
    pub enriched: Option<EnrichedOutcome>,
    pub outputs: Vec<FormattedOutput>,
    pub success: bool,
    /// The stage at which a fatal failure occurred, if any.
    pub failed_stage: Option<PipelineStage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Union of errors from all stages reached.
    pub errors: Vec<String>,
    /// Union of warnings from all stages reached.
    pub warnings: Vec<String>,
}

impl FileResult {
    /// A result for a file that never ran (worker crash, cancellation).
    pub fn failed(path: PathBuf, stage: PipelineStage, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            path,
            extraction: None,
            enriched: None,
            outputs: Vec::new(),
            success: false,
            failed_stage: Some(stage),
            started_at: now,
            finished_at: now,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_kind_roundtrip() {
        for kind in FragmentKind::all() {
            let s = kind.as_str();
            let parsed = FragmentKind::from_str(s);
            assert_eq!(parsed, Some(*kind), "Roundtrip failed for {s}");
        }
    }

    #[test]
    fn fragment_kind_display() {
        assert_eq!(FragmentKind::Heading.to_string(), "heading");
        assert_eq!(FragmentKind::ListItem.to_string(), "list_item");
    }

    #[test]
    fn fragment_kind_from_invalid() {
        assert_eq!(FragmentKind::from_str("unknown"), None);
        assert_eq!(FragmentKind::from_str(""), None);
    }

    #[test]
    fn fragment_kind_serde_roundtrip() {
        let kind = FragmentKind::ListItem;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"list_item\"");
        let parsed: FragmentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kind);
    }

    #[test]
    fn fragment_builders() {
        let frag = Fragment::heading("Introduction", 2)
            .with_confidence(0.9)
            .with_metadata("style", serde_json::json!("Heading 2"));
        assert_eq!(frag.kind, FragmentKind::Heading);
        assert_eq!(frag.level, Some(2));
        assert_eq!(frag.confidence, Some(0.9));
        assert_eq!(frag.metadata["style"], serde_json::json!("Heading 2"));
    }

    #[test]
    fn with_hierarchy_preserves_identity() {
        let original = Fragment::new(FragmentKind::Paragraph, "body text").with_confidence(0.8);
        let parent_id = Uuid::new_v4();
        let linked = original.with_hierarchy(Some(parent_id), 2, vec!["A".into(), "B".into()]);

        assert_eq!(linked.id, original.id);
        assert_eq!(linked.text, original.text);
        assert_eq!(linked.confidence, original.confidence);
        assert_eq!(linked.parent, Some(parent_id));
        assert_eq!(linked.depth, 2);
        assert_eq!(linked.path, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn fragment_word_count() {
        let frag = Fragment::new(FragmentKind::Paragraph, "one two  three\nfour");
        assert_eq!(frag.word_count(), 4);
        assert!(!frag.is_empty());
        assert!(Fragment::new(FragmentKind::Paragraph, "   ").is_empty());
    }

    #[test]
    fn extraction_outcome_failed() {
        let outcome = ExtractionOutcome::failed("corrupt file");
        assert!(!outcome.success);
        assert_eq!(outcome.errors, vec!["corrupt file".to_string()]);
        assert!(outcome.fragments.is_empty());
    }

    #[test]
    fn enriched_from_extraction_carries_diagnostics() {
        let mut extraction = ExtractionOutcome::ok(
            vec![Fragment::new(FragmentKind::Paragraph, "text")],
            DocumentMetadata::default(),
        );
        extraction.warnings.push("partial table".to_string());

        let enriched = EnrichedOutcome::from_extraction(&extraction);
        assert_eq!(enriched.fragments.len(), 1);
        assert_eq!(enriched.warnings, vec!["partial table".to_string()]);
        assert!(enriched.quality_score.is_none());
        assert!(!enriched.needs_review);
    }

    #[test]
    fn pipeline_stage_roundtrip() {
        let stages = [
            PipelineStage::Validating,
            PipelineStage::Extracting,
            PipelineStage::Enriching,
            PipelineStage::Formatting,
            PipelineStage::Done,
        ];
        for stage in &stages {
            let s = stage.as_str();
            assert_eq!(PipelineStage::from_str(s), Some(*stage), "Roundtrip failed for {s}");
        }
    }

    #[test]
    fn pipeline_stage_serde() {
        let json = serde_json::to_string(&PipelineStage::Enriching).unwrap();
        assert_eq!(json, "\"enriching\"");
    }

    #[test]
    fn file_result_failed_helper() {
        let result = FileResult::failed(
            PathBuf::from("/tmp/report.docx"),
            PipelineStage::Extracting,
            "worker panicked",
        );
        assert!(!result.success);
        assert_eq!(result.failed_stage, Some(PipelineStage::Extracting));
        assert_eq!(result.errors, vec!["worker panicked".to_string()]);
        assert!(result.outputs.is_empty());
    }

    #[test]
    fn fragment_serde_skips_unset_fields() {
        let frag = Fragment::new(FragmentKind::Paragraph, "text");
        let json = serde_json::to_string(&frag).unwrap();
        assert!(!json.contains("raw_text"));
        assert!(!json.contains("level"));
        assert!(!json.contains("parent"));
        assert!(!json.contains("path"));
    }
}
