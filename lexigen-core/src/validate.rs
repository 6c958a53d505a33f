//! Candidate validation.
//!
//! Validators answer accept/reject only; the reasons go to tracing so
//! the retry loop can log them per attempt without threading a reason
//! type through every caller.

use std::path::Path;

use serde_json::Value;

use crate::errors::PipelineError;
use crate::response::Candidate;

/// Accepts or rejects a candidate value.
pub trait ResponseValidator: Send + Sync {
    /// Returns `true` when the candidate is acceptable.
    fn validate(&self, candidate: &Candidate) -> bool;
}

/// Accepts everything except the explicit absent value (JSON `null`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistenceValidator;

impl ResponseValidator for ExistenceValidator {
    fn validate(&self, candidate: &Candidate) -> bool {
        !matches!(candidate, Candidate::Json(Value::Null))
    }
}

/// Requires the candidate to be structured data, optionally conforming
/// to a JSON schema.
///
/// A text candidate is JSON-parsed first; a parse failure is a
/// validation failure, not an error. With `require_schema` set, a
/// validator that ended up without a schema rejects everything — and
/// [`SchemaValidator::from_path`] surfaces that situation at
/// construction time instead of at first call.
#[derive(Debug)]
pub struct SchemaValidator {
    compiled: Option<jsonschema::Validator>,
    require_schema: bool,
}

impl SchemaValidator {
    /// Builds a validator from an optional in-memory schema document.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Schema`] when the schema does not compile, and
    /// [`PipelineError::SchemaUnavailable`] when `require_schema` is
    /// set but no schema was given.
    pub fn new(schema: Option<&Value>, require_schema: bool) -> Result<Self, PipelineError> {
        if require_schema && schema.is_none() {
            return Err(PipelineError::SchemaUnavailable {
                location: "<none>".to_string(),
                reason: "schema validation required but no schema provided".to_string(),
            });
        }
        let compiled = match schema {
            Some(document) => Some(
                jsonschema::Validator::new(document)
                    .map_err(|error| PipelineError::Schema(error.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            compiled,
            require_schema,
        })
    }

    /// Builds a validator whose schema is loaded from a file.
    ///
    /// When the file is missing or malformed: with `require_schema` the
    /// failure is fatal here, otherwise the validator degrades to a
    /// plain is-it-JSON check with a warn-level diagnostic.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SchemaUnavailable`] when the required schema
    /// cannot be read or parsed; [`PipelineError::Schema`] when the
    /// document does not compile as a schema.
    pub fn from_path(path: &Path, require_schema: bool) -> Result<Self, PipelineError> {
        match load_schema(path) {
            Ok(document) => Self::new(Some(&document), require_schema),
            Err(reason) if require_schema => Err(PipelineError::SchemaUnavailable {
                location: path.display().to_string(),
                reason,
            }),
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "schema could not be loaded, validating structure only"
                );
                Self::new(None, false)
            }
        }
    }

    /// Builds a validator with no schema: candidates only need to be
    /// parseable as JSON.
    #[must_use]
    pub const fn structure_only() -> Self {
        Self {
            compiled: None,
            require_schema: false,
        }
    }
}

impl ResponseValidator for SchemaValidator {
    fn validate(&self, candidate: &Candidate) -> bool {
        let parsed;
        let value: &Value = match candidate {
            Candidate::Json(value) => value,
            Candidate::Text(text) => match serde_json::from_str(text) {
                Ok(value) => {
                    parsed = value;
                    &parsed
                }
                Err(error) => {
                    tracing::warn!(%error, "candidate is not valid JSON");
                    return false;
                }
            },
        };

        if self.require_schema && self.compiled.is_none() {
            tracing::warn!("schema validation required but no schema is loaded");
            return false;
        }

        if let Some(validator) = &self.compiled {
            let errors: Vec<String> = validator
                .iter_errors(value)
                .map(|error| format!("at '{}': {error}", error.instance_path))
                .collect();
            if !errors.is_empty() {
                tracing::warn!(errors = ?errors, "schema validation failed");
                return false;
            }
        }

        true
    }
}

fn load_schema(path: &Path) -> Result<Value, String> {
    let text = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    serde_json::from_str(&text).map_err(|error| error.to_string())
}
