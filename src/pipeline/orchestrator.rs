//! Per-file pipeline orchestration.
//!
//! Drives one file through Validate → Extract → Enrich → Format and
//! aggregates everything into a FileResult. The stage sequence is strictly
//! sequential within one file; parallelism lives in the batch layer.
//!
//! Progress is a monotonically non-decreasing percentage: 0 at start, 20
//! after validation, 40 after extraction, 40→70 across enrichment steps,
//! 70→90 across formatters, 100 on completion.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use chrono::Utc;

use super::error::PipelineError;
use super::graph;
use super::import::{compute_source_hash, detect_format};
use super::traits::{EnrichmentStep, Extractor, Formatter};
use super::types::{
    EnrichedOutcome, ExtractionOutcome, FileResult, FormattedOutput, PipelineStage,
};

/// Per-file progress observer. Receives percentages in [0,100].
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

pub struct PipelineOrchestrator {
    extractors: Vec<Box<dyn Extractor>>,
    steps: Vec<Box<dyn EnrichmentStep>>,
    step_order: Vec<usize>,
    formatters: Vec<Box<dyn Formatter>>,
}

impl PipelineOrchestrator {
    /// Build an orchestrator. The enrichment execution order is resolved
    /// here, once — a cyclic or unresolved dependency fails construction
    /// before any file is processed.
    pub fn new(
        extractors: Vec<Box<dyn Extractor>>,
        steps: Vec<Box<dyn EnrichmentStep>>,
        formatters: Vec<Box<dyn Formatter>>,
    ) -> Result<Self, PipelineError> {
        let step_order = graph::resolve_order(&steps)?;
        Ok(Self {
            extractors,
            steps,
            step_order,
            formatters,
        })
    }

    /// Standard pipeline: built-in text/CSV extractors, hierarchy + quality +
    /// statistics enrichment, JSON + Markdown + chunk formatters.
    pub fn with_defaults() -> Result<Self, PipelineError> {
        use super::chunker::ChunkConfig;
        use super::extractors::{CsvExtractor, TextExtractor};
        use super::formatters::{ChunkFormatter, JsonFormatter, MarkdownFormatter};
        use super::hierarchy::HierarchyLinker;
        use super::quality::QualityScorer;
        use super::statistics::StatisticsStep;

        Self::new(
            vec![Box::new(TextExtractor::new()), Box::new(CsvExtractor::new())],
            vec![
                Box::new(HierarchyLinker::new()),
                Box::new(QualityScorer::default()),
                Box::new(StatisticsStep::new()),
            ],
            vec![
                Box::new(JsonFormatter::new()),
                Box::new(MarkdownFormatter::new()),
                Box::new(ChunkFormatter::new(ChunkConfig::default())),
            ],
        )
    }

    /// Run one file through the full pipeline. Never panics for file-level
    /// problems; everything lands in the returned FileResult.
    pub fn process_file(&self, path: &Path, on_progress: Option<ProgressFn<'_>>) -> FileResult {
        let started_at = Utc::now();
        let mut progress = ProgressReporter::new(on_progress);
        progress.report(0);

        let mut warnings: Vec<String> = Vec::new();

        // Step 1: Validation — file readable, non-empty, extractor available
        let format = match detect_format(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Validation failed");
                return FileResult::failed(path.to_path_buf(), PipelineStage::Validating, e.to_string());
            }
        };
        let Some(extractor) = self.extractors.iter().find(|x| x.format() == format) else {
            let message = format!("No extractor registered for format '{format}'");
            tracing::warn!(path = %path.display(), %format, "Validation failed: no extractor");
            return FileResult::failed(path.to_path_buf(), PipelineStage::Validating, message);
        };
        progress.report(20);

        // Step 2: Extraction
        tracing::info!(path = %path.display(), %format, "Extracting document");
        let mut extraction = extractor.extract(path);
        if extraction.metadata.source_hash.is_none() {
            extraction.metadata.source_hash = compute_source_hash(path).ok();
        }
        if extraction.success && extraction.metadata.word_count == 0 {
            extraction.metadata.word_count =
                extraction.fragments.iter().map(|f| f.word_count()).sum();
            extraction.metadata.char_count = extraction
                .fragments
                .iter()
                .map(|f| f.text.chars().count())
                .sum();
        }
        if !extraction.success {
            tracing::warn!(
                path = %path.display(),
                errors = extraction.errors.len(),
                "Extraction failed"
            );
            let errors = extraction.errors.clone();
            let extraction_warnings = extraction.warnings.clone();
            return FileResult {
                path: path.to_path_buf(),
                extraction: Some(extraction),
                enriched: None,
                outputs: Vec::new(),
                success: false,
                failed_stage: Some(PipelineStage::Extracting),
                started_at,
                finished_at: Utc::now(),
                errors,
                warnings: extraction_warnings,
            };
        }
        progress.report(40);

        // Step 3: Enrichment, in dependency-resolved order
        let mut enriched = EnrichedOutcome::from_extraction(&extraction);
        let total_steps = self.step_order.len();
        for (i, &idx) in self.step_order.iter().enumerate() {
            let step = &self.steps[idx];
            match step.process(&enriched) {
                Ok(next) => enriched = next,
                Err(e) if step.is_optional() => {
                    // Graceful degradation: the step's input flows on unchanged
                    tracing::warn!(step = step.name(), error = %e, "Optional enrichment step failed");
                    warnings.push(format!("Optional step '{}' failed: {e}", step.name()));
                }
                Err(e) => {
                    tracing::error!(step = step.name(), error = %e, "Enrichment step failed");
                    return self.fail_enriching(path, started_at, extraction, enriched, warnings, e);
                }
            }
            progress.report(40 + (((i + 1) * 30) / total_steps) as u8);
        }
        progress.report(70);

        // Step 4: Formatting — failures are warnings, other formatters still run
        let mut outputs: Vec<FormattedOutput> = Vec::new();
        let total_formatters = self.formatters.len();
        for (i, formatter) in self.formatters.iter().enumerate() {
            let output = formatter.format(&enriched);
            if !output.success {
                tracing::warn!(formatter = formatter.name(), "Formatter failed");
                warnings.push(format!(
                    "Formatter '{}' failed: {}",
                    formatter.name(),
                    output.errors.join("; ")
                ));
            }
            outputs.push(output);
            progress.report(70 + (((i + 1) * 20) / total_formatters) as u8);
        }
        progress.report(100);

        let errors = enriched.errors.clone();
        let mut all_warnings = enriched.warnings.clone();
        all_warnings.extend(warnings);

        tracing::info!(
            path = %path.display(),
            fragments = enriched.fragments.len(),
            outputs = outputs.len(),
            quality = enriched.quality_score,
            "Pipeline complete"
        );

        FileResult {
            path: path.to_path_buf(),
            extraction: Some(extraction),
            enriched: Some(enriched),
            outputs,
            success: true,
            failed_stage: None,
            started_at,
            finished_at: Utc::now(),
            errors,
            warnings: all_warnings,
        }
    }

    fn fail_enriching(
        &self,
        path: &Path,
        started_at: chrono::DateTime<Utc>,
        extraction: ExtractionOutcome,
        last_good: EnrichedOutcome,
        mut warnings: Vec<String>,
        error: PipelineError,
    ) -> FileResult {
        let mut errors = last_good.errors.clone();
        errors.push(error.to_string());
        let mut all_warnings = last_good.warnings.clone();
        all_warnings.append(&mut warnings);
        FileResult {
            path: path.to_path_buf(),
            extraction: Some(extraction),
            enriched: Some(last_good),
            outputs: Vec::new(),
            success: false,
            failed_stage: Some(PipelineStage::Enriching),
            started_at,
            finished_at: Utc::now(),
            errors,
            warnings: all_warnings,
        }
    }
}

/// Wraps the optional per-file callback: enforces monotonicity and isolates
/// the pipeline from a panicking observer.
struct ProgressReporter<'a> {
    callback: Option<ProgressFn<'a>>,
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: Option<ProgressFn<'a>>) -> Self {
        Self { callback, last: 0 }
    }

    fn report(&mut self, pct: u8) {
        if pct < self.last {
            return;
        }
        self.last = pct;
        if let Some(callback) = self.callback {
            let _ = catch_unwind(AssertUnwindSafe(|| callback(pct)));
        }
    }
}
