//! Built-in extractors for text-based formats.
//!
//! Binary formats (DOCX, PDF, XLSX, PPTX) need real parsers and are
//! registered by the caller as external [`Extractor`] implementations.
//!
//! [`Extractor`]: crate::pipeline::traits::Extractor

pub mod csv;
pub mod text;

pub use csv::CsvExtractor;
pub use text::TextExtractor;

/// Plain-text reads carry no parsing uncertainty.
pub const PLAIN_TEXT_CONFIDENCE: f32 = 0.99;
