//! Template loading and prompt construction.

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::errors::PipelineError;
use crate::format::{extract_placeholders, format_template, SubstitutionPolicy};
use crate::Record;

/// A readable text resource holding a prompt template.
pub trait TemplateSource: Send + Sync {
    /// Whether the resource currently exists.
    fn exists(&self) -> bool;
    /// Reads the full template content.
    fn read(&self) -> io::Result<String>;
    /// Human-readable description of the resource, for diagnostics.
    fn location(&self) -> String;
}

/// A template stored in a file (conventionally Markdown).
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    path: PathBuf,
}

impl FileTemplateSource {
    /// Creates a source for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemplateSource for FileTemplateSource {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// A template held directly in memory. Useful for tests and for
/// embedding a fixed prompt in a binary.
#[derive(Debug, Clone)]
pub struct InlineTemplateSource {
    content: String,
}

impl InlineTemplateSource {
    /// Creates a source wrapping the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl TemplateSource for InlineTemplateSource {
    fn exists(&self) -> bool {
        true
    }

    fn read(&self) -> io::Result<String> {
        Ok(self.content.clone())
    }

    fn location(&self) -> String {
        "<inline>".to_string()
    }
}

/// Owns one prompt template and turns records into finished prompts.
///
/// The template is loaded once and is logically immutable; [`reload`]
/// atomically replaces it, so a concurrent `format` sees either the old
/// or the new template, never a torn mix.
///
/// [`reload`]: TemplatePrompter::reload
pub struct TemplatePrompter {
    source: Box<dyn TemplateSource>,
    template: RwLock<String>,
    policy: SubstitutionPolicy,
}

impl std::fmt::Debug for TemplatePrompter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplatePrompter")
            .field("source", &self.source.location())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TemplatePrompter {
    /// Loads the template from `source`.
    ///
    /// An empty template is accepted with a warn-level diagnostic.
    ///
    /// # Errors
    ///
    /// [`PipelineError::TemplateNotFound`] when the source does not
    /// exist, [`PipelineError::TemplateRead`] when reading fails.
    pub fn load(
        source: Box<dyn TemplateSource>,
        policy: SubstitutionPolicy,
    ) -> Result<Self, PipelineError> {
        let template = read_source(&*source)?;
        Ok(Self {
            source,
            template: RwLock::new(template),
            policy,
        })
    }

    /// Loads the template from a file path with the given policy.
    ///
    /// # Errors
    ///
    /// See [`TemplatePrompter::load`].
    pub fn from_path(
        path: impl Into<PathBuf>,
        policy: SubstitutionPolicy,
    ) -> Result<Self, PipelineError> {
        Self::load(Box::new(FileTemplateSource::new(path)), policy)
    }

    /// Formats the template with the record's fields.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingVariable`] under strict substitution
    /// when a placeholder has no corresponding field.
    pub fn format(&self, record: &Record) -> Result<String, PipelineError> {
        format_template(&self.template.read(), record, self.policy)
    }

    /// Re-reads the source and atomically replaces the in-memory
    /// template. On failure the previous template stays in place.
    ///
    /// # Errors
    ///
    /// Same as [`TemplatePrompter::load`].
    pub fn reload(&self) -> Result<(), PipelineError> {
        let fresh = read_source(&*self.source)?;
        *self.template.write() = fresh;
        tracing::debug!(location = %self.source.location(), "template reloaded");
        Ok(())
    }

    /// The deduplicated set of placeholder names the current template
    /// needs, for validating input records before a run.
    #[must_use]
    pub fn required_variables(&self) -> BTreeSet<String> {
        extract_placeholders(&self.template.read())
            .into_iter()
            .collect()
    }

    /// The substitution policy this prompter formats with.
    #[must_use]
    pub const fn policy(&self) -> SubstitutionPolicy {
        self.policy
    }
}

fn read_source(source: &dyn TemplateSource) -> Result<String, PipelineError> {
    if !source.exists() {
        return Err(PipelineError::TemplateNotFound {
            location: source.location(),
        });
    }
    let template = source.read().map_err(|error| PipelineError::TemplateRead {
        location: source.location(),
        source: error,
    })?;
    if template.is_empty() {
        tracing::warn!(location = %source.location(), "template is empty");
    }
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), json!(value)))
            .collect()
    }

    #[test]
    fn missing_file_is_template_not_found() {
        let err = TemplatePrompter::from_path(
            "/nonexistent/prompt.md",
            SubstitutionPolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::TemplateNotFound { .. }));
    }

    #[test]
    fn loads_and_formats_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Define {{word}} as used in {{language}}.").unwrap();

        let prompter =
            TemplatePrompter::from_path(file.path(), SubstitutionPolicy::Strict).unwrap();
        let prompt = prompter
            .format(&record(&[("word", "hund"), ("language", "Swedish")]))
            .unwrap();
        assert_eq!(prompt, "Define hund as used in Swedish.");
    }

    #[test]
    fn empty_template_loads_without_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let prompter =
            TemplatePrompter::from_path(file.path(), SubstitutionPolicy::Strict).unwrap();
        assert!(prompter.required_variables().is_empty());
        assert_eq!(prompter.format(&Record::new()).unwrap(), "");
    }

    #[test]
    fn reload_picks_up_new_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "old {{word}}").unwrap();
        file.flush().unwrap();

        let prompter =
            TemplatePrompter::from_path(file.path(), SubstitutionPolicy::Strict).unwrap();
        assert_eq!(
            prompter.format(&record(&[("word", "x")])).unwrap(),
            "old x"
        );

        std::fs::write(file.path(), "new {word}").unwrap();
        prompter.reload().unwrap();
        assert_eq!(
            prompter.format(&record(&[("word", "x")])).unwrap(),
            "new x"
        );
    }

    #[test]
    fn required_variables_are_deduplicated() {
        let prompter = TemplatePrompter::load(
            Box::new(InlineTemplateSource::new("{word} {pos} {word}")),
            SubstitutionPolicy::Strict,
        )
        .unwrap();
        let required: Vec<_> = prompter.required_variables().into_iter().collect();
        assert_eq!(required, vec!["pos".to_string(), "word".to_string()]);
    }

    #[test]
    fn inline_source_always_exists() {
        let source = InlineTemplateSource::new("hello");
        assert!(source.exists());
        assert_eq!(source.read().unwrap(), "hello");
    }
}
