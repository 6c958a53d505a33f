//! The model abstraction consumed by the pipeline.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::GeneratorError;

/// Per-call overrides for generation parameters.
///
/// Every field is optional; backends resolve the effective value as
/// built-in default < backend configuration < per-call override.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Model identifier override.
    pub model: Option<String>,
    /// Maximum output length override, in tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Call timeout override.
    pub timeout: Option<Duration>,
}

/// A text-generation backend: turns a prompt string into raw text.
///
/// Implementations perform exactly one outbound call per invocation and
/// never retry internally — retry policy is the pipeline's concern,
/// kept centralized and backend-agnostic. Absence of a result is always
/// an error, never an empty string.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates text for `prompt`.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Configuration`] when required credentials or
    /// model identifier are absent, [`GeneratorError::Call`] for any
    /// underlying transport or timeout failure, and
    /// [`GeneratorError::EmptyCompletion`] when the backend replies
    /// with no content.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, GeneratorError>;
}
