//! Source-file content hashing for deduplication by callers.

use std::path::Path;

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::pipeline::error::PipelineError;

/// Compute the SHA-256 content hash of a source file, base64-encoded.
pub fn compute_source_hash(path: &Path) -> Result<String, PipelineError> {
    let content = std::fs::read(path)?;
    let hash = Sha256::digest(&content);
    Ok(base64::engine::general_purpose::STANDARD.encode(hash))
}
