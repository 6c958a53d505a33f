//! The candidate value produced by response extraction.

use serde::Serialize;
use serde_json::Value;

/// An extractor's best-effort interpretation of a raw model response:
/// either parsed JSON or the text passed through unchanged.
///
/// Only these two shapes ever occur downstream, so the pipeline uses a
/// closed sum type rather than an open generic parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Candidate {
    /// Structured data parsed from the response.
    Json(Value),
    /// The response (or its first fenced block) as plain text.
    Text(String),
}

impl Candidate {
    /// An empty structured value, produced for empty raw responses.
    #[must_use]
    pub fn empty() -> Self {
        Self::Json(Value::Object(serde_json::Map::new()))
    }

    /// The structured payload, if this candidate parsed as a JSON object.
    #[must_use]
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            Self::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// The text payload, if this candidate is a passthrough string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Converts the candidate into a plain JSON value (text becomes a
    /// JSON string), e.g. for writing batch output.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }

    /// A short description for diagnostics, truncated so a misbehaving
    /// model cannot flood the logs.
    #[must_use]
    pub fn summary(&self) -> String {
        const LIMIT: usize = 200;
        let rendered = match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        };
        if rendered.chars().count() > LIMIT {
            let mut head: String = rendered.chars().take(LIMIT).collect();
            head.push_str("...");
            head
        } else {
            rendered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_is_an_empty_object() {
        assert_eq!(Candidate::empty(), Candidate::Json(json!({})));
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_value(Candidate::Json(json!({"word": "x"}))).unwrap();
        assert_eq!(json, json!({"word": "x"}));
        let text = serde_json::to_value(Candidate::Text("plain".into())).unwrap();
        assert_eq!(text, json!("plain"));
    }

    #[test]
    fn summary_truncates_long_text() {
        let long = Candidate::Text("x".repeat(500));
        assert!(long.summary().len() < 250);
        assert!(long.summary().ends_with("..."));
    }
}
