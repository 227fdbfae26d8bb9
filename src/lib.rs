//! docpipe — document processing pipeline.
//!
//! Ingests heterogeneous documents, converts each into a uniform sequence of
//! typed content fragments, enriches that sequence with structural and
//! quality metadata, and emits AI-consumable representations. Batches fan
//! out over a bounded worker pool; results always come back in input order.

pub mod config;
pub mod pipeline;

pub use pipeline::batch::{summarize, BatchConfig, BatchCoordinator, BatchSummary};
pub use pipeline::chunker::{Chunk, ChunkConfig, ChunkSplitter};
pub use pipeline::error::PipelineError;
pub use pipeline::import::DocumentFormat;
pub use pipeline::orchestrator::PipelineOrchestrator;
pub use pipeline::progress::{BatchProgressEvent, ProgressTracker};
pub use pipeline::traits::{EnrichmentStep, Extractor, Formatter};
pub use pipeline::types::{
    EnrichedOutcome, ExtractionOutcome, FileResult, FormattedOutput, Fragment, FragmentKind,
    PipelineStage,
};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binary callers. Respects RUST_LOG, falling back to
/// the crate default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
