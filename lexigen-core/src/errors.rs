//! Public error types for the generation pipeline.

use thiserror::Error;

/// Errors raised by a [`crate::generator::Generator`] backend.
///
/// Configuration problems (missing credentials, blank model identifier)
/// are surfaced at construction time where possible and are never
/// silently degraded to a default. Transport failures wrap the
/// underlying cause as text; absence of a completion is always an error,
/// never an empty-string sentinel.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Required credentials or model identifier are absent or invalid.
    #[error("backend configuration error: {0}")]
    Configuration(String),

    /// The outbound call to the model backend failed (transport error,
    /// non-success HTTP status, timeout, or unparseable reply).
    #[error("backend call failed: {0}")]
    Call(String),

    /// The backend replied successfully but the completion was empty.
    #[error("backend returned an empty completion")]
    EmptyCompletion,
}

/// Errors raised by the generation pipeline and its stages.
///
/// The taxonomy matters for retry behavior: `MissingVariable` and the
/// template errors are caller-input problems raised before the retry
/// loop starts; `Generator`, `Extraction`, and `InvalidResponse` are
/// transient and consume the shared attempt budget; `Schema`,
/// `SchemaUnavailable`, and `Config` are construction-time failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A template placeholder had no corresponding record field
    /// (strict substitution only). Names the missing key.
    #[error("missing required template variable: '{name}'")]
    MissingVariable {
        /// The placeholder name with no supplied value.
        name: String,
    },

    /// The template source does not exist.
    #[error("template not found: {location}")]
    TemplateNotFound {
        /// Human-readable description of the source (e.g., a file path).
        location: String,
    },

    /// The template source exists but could not be read.
    #[error("failed to read template {location}: {source}")]
    TemplateRead {
        /// Human-readable description of the source.
        location: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A backend failure, forwarded from the generator.
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// A response extractor failed to produce a candidate.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The validator rejected an otherwise well-formed candidate.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A provided JSON schema document did not compile.
    #[error("schema error: {0}")]
    Schema(String),

    /// A schema was required but could not be loaded.
    #[error("required schema could not be loaded from {location}: {reason}")]
    SchemaUnavailable {
        /// Where the schema was expected.
        location: String,
        /// Why loading failed.
        reason: String,
    },

    /// Invalid pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
