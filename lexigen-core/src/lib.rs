//! # lexigen-core
//!
//! The generation pipeline used to enrich structured records with
//! model-generated content: a templated prompt is built from a record,
//! sent to a [`Generator`] backend, the raw response is reduced to a
//! [`Candidate`] value, validated, and retried on transient failure
//! under a single shared attempt budget.
//!
//! ## Example
//!
//! ```no_run
//! # use lexigen_core::prelude::*;
//! # use lexigen_core::prompter::InlineTemplateSource;
//! # async fn example(generator: Box<dyn Generator>) -> Result<(), PipelineError> {
//! let prompter = TemplatePrompter::load(
//!     Box::new(InlineTemplateSource::new("Define the word {word}.")),
//!     SubstitutionPolicy::Strict,
//! )?;
//!
//! let pipeline = GenerationPipeline::builder(generator, prompter)
//!     .validator(Box::new(ExistenceValidator))
//!     .build();
//!
//! let mut record = Record::new();
//! record.insert("word".into(), "ubiquitous".into());
//!
//! let enriched = pipeline.handle(&record, &GenerateOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Pipeline and backend configuration structures.
pub mod config;

/// Public error types.
pub mod errors;

/// Response extraction: fenced blocks and JSON parsing.
pub mod extract;

/// Template substitution and placeholder extraction.
pub mod format;

/// The model abstraction consumed by the pipeline.
pub mod generator;

/// The retrying generation pipeline.
pub mod handler;

/// Commonly used types and traits.
pub mod prelude;

/// Template loading and prompt construction.
pub mod prompter;

/// The candidate value produced by extraction.
pub mod response;

/// Candidate validation.
pub mod validate;

/// One unit of work for the pipeline: an ordered mapping of field name
/// to field value (e.g., a vocabulary word with part-of-speech and
/// translation). The pipeline never mutates the caller's record; it
/// produces a derived result.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub use errors::{GeneratorError, PipelineError};
pub use format::SubstitutionPolicy;
pub use generator::{GenerateOptions, Generator};
pub use handler::{BackoffStrategy, GenerationPipeline, RetryPolicy};
pub use prompter::TemplatePrompter;
pub use response::Candidate;
