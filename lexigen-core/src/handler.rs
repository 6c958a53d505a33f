//! The retrying generation pipeline.
//!
//! One call to [`GenerationPipeline::handle`] walks
//! format → generate → extract → validate, retrying the
//! generate→extract→validate cycle on transient failure under a single
//! shared attempt budget. Formatting failures are caller-input
//! problems and are never retried. All retry state lives on the call
//! stack, so one pipeline instance can serve concurrent calls without
//! locking.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::errors::PipelineError;
use crate::extract::{CodeBlockExtractor, ResponseExtractor};
use crate::generator::{GenerateOptions, Generator};
use crate::prompter::TemplatePrompter;
use crate::response::Candidate;
use crate::validate::ResponseValidator;
use crate::Record;

/// Delay schedule between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// The same delay after every failed attempt.
    Constant(Duration),
    /// `initial * factor^(attempt-1)`, capped at `max`.
    Exponential {
        /// Delay after the first failed attempt.
        initial: Duration,
        /// Multiplier applied per subsequent attempt.
        factor: f64,
        /// Upper bound on any single delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// The delay to apply after failed attempt number `attempt`
    /// (1-indexed).
    #[must_use]
    pub fn delay(&self, attempt: usize) -> Duration {
        match *self {
            Self::Constant(delay) => delay,
            Self::Exponential {
                initial,
                factor,
                max,
            } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let scaled = initial.as_secs_f64() * factor.powi(exponent);
                Duration::from_secs_f64(scaled).min(max)
            }
        }
    }
}

/// Retry behavior for one pipeline.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum generate→extract→validate cycles per `handle` call.
    pub max_attempts: usize,
    /// Delay schedule between attempts.
    pub backoff: BackoffStrategy,
    /// Optional overall budget: once elapsed time exceeds it, the loop
    /// stops early with the last error instead of sleeping again.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Constant(Duration::from_secs(2)),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// Sets the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets an overall deadline across all attempts.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Composes prompter, generator, extractor, and validator into a
/// retrying enrichment pipeline.
pub struct GenerationPipeline {
    generator: Box<dyn Generator>,
    prompter: TemplatePrompter,
    extractor: Box<dyn ResponseExtractor>,
    validator: Option<Box<dyn ResponseValidator>>,
    retry: RetryPolicy,
}

/// Fluent construction for [`GenerationPipeline`].
///
/// Defaults: [`CodeBlockExtractor`] with JSON parsing, no validator
/// (every candidate accepted), three attempts with 2s constant backoff.
pub struct GenerationPipelineBuilder {
    generator: Box<dyn Generator>,
    prompter: TemplatePrompter,
    extractor: Box<dyn ResponseExtractor>,
    validator: Option<Box<dyn ResponseValidator>>,
    retry: RetryPolicy,
}

impl GenerationPipelineBuilder {
    /// Replaces the default extractor.
    #[must_use]
    pub fn extractor(mut self, extractor: Box<dyn ResponseExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets a validator; without one every candidate is accepted.
    #[must_use]
    pub fn validator(mut self, validator: Box<dyn ResponseValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Replaces the default retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Finishes construction.
    #[must_use]
    pub fn build(self) -> GenerationPipeline {
        GenerationPipeline {
            generator: self.generator,
            prompter: self.prompter,
            extractor: self.extractor,
            validator: self.validator,
            retry: self.retry,
        }
    }
}

impl GenerationPipeline {
    /// Starts building a pipeline around a generator and a prompter.
    #[must_use]
    pub fn builder(
        generator: Box<dyn Generator>,
        prompter: TemplatePrompter,
    ) -> GenerationPipelineBuilder {
        GenerationPipelineBuilder {
            generator,
            prompter,
            extractor: Box::new(CodeBlockExtractor::new()),
            validator: None,
            retry: RetryPolicy::default(),
        }
    }

    /// The prompter this pipeline formats with, e.g. to check
    /// [`TemplatePrompter::required_variables`] against input records
    /// before a batch run.
    #[must_use]
    pub const fn prompter(&self) -> &TemplatePrompter {
        &self.prompter
    }

    /// Enriches one record: formats the prompt, then runs the
    /// generate→extract→validate cycle under the shared attempt budget.
    ///
    /// The prompt is built once; a formatting failure is a caller-input
    /// problem and is surfaced immediately without touching the budget.
    /// After the budget is exhausted the *last* concrete error is
    /// returned, so callers can tell "model unreachable" from
    /// "response never validated".
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingVariable`] for a bad record under strict
    /// substitution; otherwise the final attempt's
    /// [`PipelineError::Generator`], [`PipelineError::Extraction`], or
    /// [`PipelineError::InvalidResponse`].
    pub async fn handle(
        &self,
        record: &Record,
        options: &GenerateOptions,
    ) -> Result<Candidate, PipelineError> {
        let prompt = self.prompter.format(record)?;

        let start = Instant::now();
        let mut last_error: Option<PipelineError> = None;

        for attempt in 1..=self.retry.max_attempts {
            match self.attempt(&prompt, options).await {
                Ok(candidate) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "generation succeeded after retry");
                    }
                    return Ok(candidate);
                }
                Err(error) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %error,
                        "generation attempt failed"
                    );
                    last_error = Some(error);
                }
            }

            if attempt < self.retry.max_attempts {
                if let Some(deadline) = self.retry.deadline {
                    if start.elapsed() >= deadline {
                        tracing::warn!(
                            ?deadline,
                            attempt,
                            "deadline exceeded, abandoning remaining attempts"
                        );
                        break;
                    }
                }
                let delay = self.retry.backoff.delay(attempt);
                tracing::debug!(?delay, "backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            max_attempts = self.retry.max_attempts,
            "all generation attempts failed"
        );
        Err(last_error
            .unwrap_or_else(|| PipelineError::Config("max_attempts must be at least 1".into())))
    }

    /// Like [`handle`], then deserializes the accepted candidate into a
    /// caller type.
    ///
    /// # Errors
    ///
    /// Everything [`handle`] returns, plus
    /// [`PipelineError::InvalidResponse`] when the accepted candidate
    /// does not deserialize to `T`.
    ///
    /// [`handle`]: GenerationPipeline::handle
    pub async fn handle_typed<T: DeserializeOwned>(
        &self,
        record: &Record,
        options: &GenerateOptions,
    ) -> Result<T, PipelineError> {
        let candidate = self.handle(record, options).await?;
        serde_json::from_value(candidate.into_value()).map_err(|error| {
            PipelineError::InvalidResponse(format!("deserialization failed: {error}"))
        })
    }

    /// One generate→extract→validate cycle.
    async fn attempt(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Candidate, PipelineError> {
        let raw = self.generator.generate(prompt, options).await?;
        let candidate = self.extractor.extract(&raw)?;
        if let Some(validator) = &self.validator {
            if !validator.validate(&candidate) {
                return Err(PipelineError::InvalidResponse(candidate.summary()));
            }
        }
        Ok(candidate)
    }
}
