//! Splitting the synthesizer's raw output into analysis and final answer.
//!
//! The model is asked for `{"analysis": ..., "final": ...}` but frequently
//! answers in prose. Prose falls back to a trailing `final: ...` marker, and
//! failing that the whole text is both analysis and answer. This is a
//! heuristic and is tested as one.

use regex_lite::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// `final: x`, `Final = x`, `FINAL - x` on the last line of the text.
static FINAL_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)final\s*[:=-]\s*(.+)$").ok());

/// Parsed synthesizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutput {
    pub analysis: String,
    pub final_answer: String,
}

/// Parse raw synthesizer text. `empty` is the sentinel used when nothing
/// usable was returned.
pub fn parse_synthesis_output(raw: &str, empty: &str) -> SynthesisOutput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SynthesisOutput {
            analysis: empty.to_string(),
            final_answer: empty.to_string(),
        };
    }

    if let Some(parsed) = from_json(trimmed) {
        return parsed;
    }

    let final_answer = FINAL_MARKER
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| trimmed.to_string());

    SynthesisOutput {
        analysis: trimmed.to_string(),
        final_answer,
    }
}

/// A JSON object with a non-empty `analysis` or `final`, the missing side
/// filled from the other.
fn from_json(text: &str) -> Option<SynthesisOutput> {
    let json: Value = serde_json::from_str(text).ok()?;
    let object = json.as_object()?;

    let field = |name: &str| -> String {
        match object.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string().trim().to_string(),
        }
    };
    let analysis = field("analysis");
    let final_answer = field("final");

    match (analysis.is_empty(), final_answer.is_empty()) {
        (true, true) => None,
        (false, true) => Some(SynthesisOutput {
            final_answer: analysis.clone(),
            analysis,
        }),
        (true, false) => Some(SynthesisOutput {
            analysis: final_answer.clone(),
            final_answer,
        }),
        (false, false) => Some(SynthesisOutput {
            analysis,
            final_answer,
        }),
    }
}
