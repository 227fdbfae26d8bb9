//! Trait definitions for the pipeline's collaborator seams.
//!
//! Three traits define the module boundaries:
//! - Extractor: format-specific parsing (file path → fragments)
//! - EnrichmentStep: a unit of content enrichment with declared dependencies
//! - Formatter: rendering of an enriched outcome into one target representation

use std::path::Path;

use super::error::PipelineError;
use super::import::DocumentFormat;
use super::types::{EnrichedOutcome, ExtractionOutcome, FormattedOutput};

/// Format-specific parser. Registered implementations are matched against
/// the detected format during validation.
pub trait Extractor: Send + Sync {
    /// Which document format this extractor handles.
    fn format(&self) -> DocumentFormat;

    /// Parse a file into fragments. File-level problems (corrupt file,
    /// unsupported content) are reported via the outcome's success flag and
    /// error list, never by panicking. Partial results with `success=true`
    /// and populated warnings are acceptable.
    fn extract(&self, path: &Path) -> ExtractionOutcome;
}

/// A unit of content enrichment. Steps run in dependency-resolved order,
/// each consuming the previous step's output and returning a new outcome.
pub trait EnrichmentStep: Send + Sync {
    /// Unique step name, referenced by other steps' dependencies.
    fn name(&self) -> &str;

    /// Names of steps that must run before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Optional steps degrade gracefully: on failure the pipeline logs a
    /// warning and feeds this step's input forward unchanged.
    fn is_optional(&self) -> bool {
        false
    }

    /// Produce an enriched outcome from the previous one. Must not mutate
    /// the input.
    fn process(&self, outcome: &EnrichedOutcome) -> Result<EnrichedOutcome, PipelineError>;
}

/// Renders an enriched outcome into one target representation. Failures are
/// signaled via the output's success flag; a failing formatter never aborts
/// the pipeline.
pub trait Formatter: Send + Sync {
    /// Name of the target representation (e.g., "json", "markdown").
    fn name(&self) -> &str;

    fn format(&self, outcome: &EnrichedOutcome) -> FormattedOutput;
}
