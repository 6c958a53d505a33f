//! Common imports for pipeline usage.
//!
//! ```
//! use lexigen_core::prelude::*;
//! ```

pub use crate::errors::{GeneratorError, PipelineError};
pub use crate::extract::{CodeBlockExtractor, JsonExtractor, ResponseExtractor};
pub use crate::format::SubstitutionPolicy;
pub use crate::generator::{GenerateOptions, Generator};
pub use crate::handler::{BackoffStrategy, GenerationPipeline, RetryPolicy};
pub use crate::prompter::{FileTemplateSource, TemplatePrompter, TemplateSource};
pub use crate::response::Candidate;
pub use crate::validate::{ExistenceValidator, ResponseValidator, SchemaValidator};
pub use crate::Record;
