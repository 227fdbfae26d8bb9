//! Pipeline error taxonomy.
//!
//! Stage-local failures never cross the file boundary — they are captured
//! into the FileResult and the batch moves on. Configuration errors (cyclic
//! or unresolved step dependencies) are detected once, before any file runs,
//! and abort the whole run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Enrichment step '{step}' failed: {message}")]
    Enrichment { step: String, message: String },

    #[error("Worker failure: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Processing cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
