//! Response extraction: fenced blocks and JSON parsing.
//!
//! Models often wrap JSON answers in markdown code fences, sometimes
//! tagged `json`, sometimes bare, sometimes not at all. Extractors
//! reduce that raw text to a [`Candidate`]: parsed JSON when possible,
//! the text itself otherwise. Malformed JSON is never an error here —
//! it degrades to string passthrough and is the validator's problem.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::PipelineError;
use crate::response::Candidate;

/// Reduces a raw model response to a candidate value.
///
/// Built-in extractors are infallible; the fallible signature exists so
/// custom extractors can fail, which the pipeline treats as a transient
/// fault consuming the shared attempt budget.
pub trait ResponseExtractor: Send + Sync {
    /// Produces the candidate for `raw`.
    fn extract(&self, raw: &str) -> Result<Candidate, PipelineError>;
}

/// Fenced block with an optional `json` tag, newline-delimited content.
static TAGGED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```(?:json)?[ \t]*\n([\s\S]*?)\n[ \t]*```").expect("valid fence pattern")
});

/// Any fenced region at all, as a fallback.
static BARE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([\s\S]*?)```").expect("valid fence pattern"));

/// Returns the trimmed content of the first fenced block in `text`,
/// or `None` when no fence is present.
#[must_use]
pub fn first_fenced_block(text: &str) -> Option<&str> {
    TAGGED_FENCE
        .captures(text)
        .or_else(|| BARE_FENCE.captures(text))
        .and_then(|captures| captures.get(1))
        .map(|content| content.as_str().trim())
}

/// Extractor that takes the first fenced code block (or the whole
/// response when none exists) and, by default, parses it as JSON.
///
/// Parse failure returns the candidate text unchanged; an empty raw
/// response yields an empty object.
///
/// # Examples
///
/// ```
/// use lexigen_core::extract::{CodeBlockExtractor, ResponseExtractor};
/// use serde_json::json;
///
/// let extractor = CodeBlockExtractor::new();
/// let candidate = extractor.extract("```json\n{\"word\":\"x\"}\n```").unwrap();
/// assert_eq!(candidate.as_object().unwrap()["word"], json!("x"));
/// ```
#[derive(Debug, Clone)]
pub struct CodeBlockExtractor {
    parse_json: bool,
}

impl CodeBlockExtractor {
    /// An extractor that parses the fenced content as JSON.
    #[must_use]
    pub const fn new() -> Self {
        Self { parse_json: true }
    }

    /// An extractor that returns the fenced content as text without
    /// attempting a JSON parse.
    #[must_use]
    pub const fn raw_text() -> Self {
        Self { parse_json: false }
    }
}

impl Default for CodeBlockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseExtractor for CodeBlockExtractor {
    fn extract(&self, raw: &str) -> Result<Candidate, PipelineError> {
        if raw.is_empty() {
            return Ok(Candidate::empty());
        }
        let content = first_fenced_block(raw).unwrap_or(raw);
        if self.parse_json {
            Ok(parse_or_passthrough(content))
        } else {
            Ok(Candidate::Text(content.to_string()))
        }
    }
}

/// Extractor that parses the entire response as JSON, falling back to
/// the original string. No fence handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl ResponseExtractor for JsonExtractor {
    fn extract(&self, raw: &str) -> Result<Candidate, PipelineError> {
        if raw.is_empty() {
            return Ok(Candidate::empty());
        }
        Ok(parse_or_passthrough(raw))
    }
}

fn parse_or_passthrough(content: &str) -> Candidate {
    match serde_json::from_str(content) {
        Ok(value) => Candidate::Json(value),
        Err(error) => {
            tracing::debug!(%error, "candidate is not JSON, passing through as text");
            Candidate::Text(content.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_json_from_tagged_fence() {
        let raw = "```json\n{\"word\":\"x\"}\n```";
        let candidate = CodeBlockExtractor::new().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Json(json!({"word": "x"})));
    }

    #[test]
    fn extracts_json_from_untagged_fence() {
        let raw = "Here you go:\n```\n{\"word\": \"x\", \"n\": 2}\n```\nDone.";
        let candidate = CodeBlockExtractor::new().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Json(json!({"word": "x", "n": 2})));
    }

    #[test]
    fn takes_the_first_of_multiple_fences() {
        let raw = "```json\n{\"a\": 1}\n```\ntext\n```json\n{\"b\": 2}\n```";
        let candidate = CodeBlockExtractor::new().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Json(json!({"a": 1})));
    }

    #[test]
    fn whole_text_used_when_no_fence_exists() {
        let raw = "{\"word\": \"x\"}";
        let candidate = CodeBlockExtractor::new().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Json(json!({"word": "x"})));
    }

    #[test]
    fn extraction_is_idempotent_on_clean_json() {
        let bare = CodeBlockExtractor::new().extract("{\"word\":\"x\"}").unwrap();
        let fenced = CodeBlockExtractor::new()
            .extract("```json\n{\"word\":\"x\"}\n```")
            .unwrap();
        assert_eq!(bare, fenced);
    }

    #[test]
    fn malformed_json_passes_through_as_text() {
        let candidate = CodeBlockExtractor::new().extract("not json").unwrap();
        assert_eq!(candidate, Candidate::Text("not json".into()));
    }

    #[test]
    fn malformed_json_inside_fence_passes_through() {
        let raw = "```\nnot: json: either\n```";
        let candidate = CodeBlockExtractor::new().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Text("not: json: either".into()));
    }

    #[test]
    fn empty_response_yields_empty_object() {
        assert_eq!(
            CodeBlockExtractor::new().extract("").unwrap(),
            Candidate::empty()
        );
        assert_eq!(JsonExtractor.extract("").unwrap(), Candidate::empty());
    }

    #[test]
    fn raw_text_mode_skips_json_parse() {
        let raw = "```json\n{\"word\":\"x\"}\n```";
        let candidate = CodeBlockExtractor::raw_text().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Text("{\"word\":\"x\"}".into()));
    }

    #[test]
    fn json_extractor_ignores_fences() {
        // The fence itself is not valid JSON, so the whole text passes
        // through unchanged.
        let raw = "```json\n{}\n```";
        let candidate = JsonExtractor.extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Text(raw.into()));
    }

    #[test]
    fn non_object_json_is_still_structured() {
        let candidate = CodeBlockExtractor::new().extract("[1, 2, 3]").unwrap();
        assert_eq!(candidate, Candidate::Json(json!([1, 2, 3])));
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        let raw = "```JSON\n{\"a\": true}\n```";
        let candidate = CodeBlockExtractor::new().extract(raw).unwrap();
        assert_eq!(candidate, Candidate::Json(json!({"a": true})));
    }
}
