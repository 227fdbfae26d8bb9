//! Built-in formatters: JSON, Markdown, and token-bounded chunks.

pub mod chunks;
pub mod json;
pub mod markdown;

pub use chunks::ChunkFormatter;
pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
