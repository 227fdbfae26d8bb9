//! File intake: format detection and source hashing.

pub mod format;
pub mod hash;

pub use format::{detect_format, DocumentFormat};
pub use hash::compute_source_hash;
