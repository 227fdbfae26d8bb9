pub mod types;
pub mod error;
pub mod traits;
pub mod import; // Format detection + source hashing
pub mod graph; // Enrichment step dependency resolution
pub mod hierarchy;
pub mod quality;
pub mod statistics;
pub mod chunker;
pub mod progress;
pub mod extractors; // Built-in text-based extractors
pub mod formatters;
pub mod orchestrator;
pub mod batch;
