//! JSON formatter — serializes the full enriched outcome.

use crate::pipeline::traits::Formatter;
use crate::pipeline::types::{EnrichedOutcome, FormattedOutput};

pub const FORMAT_NAME: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        FORMAT_NAME
    }

    fn format(&self, outcome: &EnrichedOutcome) -> FormattedOutput {
        match serde_json::to_string_pretty(outcome) {
            Ok(content) => FormattedOutput::ok(FORMAT_NAME, content),
            Err(e) => FormattedOutput::failed(FORMAT_NAME, format!("Serialization failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{ExtractionOutcome, Fragment, FragmentKind};

    #[test]
    fn serializes_fragments_and_metadata() {
        let extraction = ExtractionOutcome::ok(
            vec![Fragment::new(FragmentKind::Paragraph, "hello world")],
            Default::default(),
        );
        let mut outcome = EnrichedOutcome::from_extraction(&extraction);
        outcome.quality_score = Some(87.5);

        let output = JsonFormatter::new().format(&outcome);
        assert!(output.success);

        let parsed: serde_json::Value = serde_json::from_str(&output.content).unwrap();
        assert_eq!(parsed["fragments"][0]["text"], "hello world");
        assert_eq!(parsed["quality_score"], 87.5);
    }

    #[test]
    fn empty_outcome_still_renders() {
        let output = JsonFormatter::new().format(&EnrichedOutcome::default());
        assert!(output.success);
        assert!(output.content.contains("\"fragments\": []"));
    }
}
