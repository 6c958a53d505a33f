//! Template substitution and placeholder extraction.
//!
//! Templates use `{name}` placeholders. Doubled braces (`{{` / `}}`)
//! are escapes and decay to a literal single brace in the output; they
//! are never substitution targets. An empty or unterminated placeholder
//! passes through literally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PipelineError;
use crate::Record;

/// How substitution treats a placeholder with no corresponding variable.
///
/// Both behaviors exist in the wild; callers pick one explicitly rather
/// than relying on an implicit default buried in the formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionPolicy {
    /// Every placeholder must have a variable; a missing one is an
    /// error naming the key, and a supplied variable the template never
    /// references produces a warn-level diagnostic.
    #[default]
    Strict,
    /// A placeholder with no variable is left verbatim in the output
    /// (e.g., `{age}` stays as the literal text `{age}`).
    Lenient,
}

/// Substitutes record fields into `template` under the given policy.
///
/// Unused variables under [`SubstitutionPolicy::Strict`] are reported as
/// `tracing::warn!` events, one per variable.
///
/// # Errors
///
/// Returns [`PipelineError::MissingVariable`] in strict mode when a
/// placeholder has no corresponding record field.
///
/// # Examples
///
/// ```
/// use lexigen_core::format::{format_template, SubstitutionPolicy};
/// use lexigen_core::Record;
///
/// let mut vars = Record::new();
/// vars.insert("name".into(), "Alice".into());
///
/// let out = format_template("Hello, {name}!", &vars, SubstitutionPolicy::Strict).unwrap();
/// assert_eq!(out, "Hello, Alice!");
/// ```
pub fn format_template(
    template: &str,
    variables: &Record,
    policy: SubstitutionPolicy,
) -> Result<String, PipelineError> {
    let (output, unused) = substitute(template, variables, policy)?;
    for name in unused {
        tracing::warn!(variable = %name, "unused template variable");
    }
    Ok(output)
}

/// Returns the placeholder names in `template`, in source order,
/// including repeats of the same name. Escaped placeholders
/// (`{{name}}`) are never included.
///
/// # Examples
///
/// ```
/// use lexigen_core::format::extract_placeholders;
///
/// let names = extract_placeholders("{word} ({pos}): {word}");
/// assert_eq!(names, vec!["word", "pos", "word"]);
/// ```
#[must_use]
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    scan(template, |piece| {
        if let Piece::Placeholder(name) = piece {
            names.push(name.to_string());
        }
    });
    names
}

/// One lexical element of a template.
enum Piece<'a> {
    /// Literal text, emitted as-is (escapes already collapsed).
    Literal(&'a str),
    /// A `{name}` substitution target.
    Placeholder(&'a str),
}

/// Walks `template`, yielding literals and placeholders in order.
///
/// Braces are ASCII, so slicing at their byte offsets is always valid.
fn scan<'a>(template: &'a str, mut emit: impl FnMut(Piece<'a>)) {
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        if pos > 0 {
            emit(Piece::Literal(&rest[..pos]));
        }
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{") {
            emit(Piece::Literal("{"));
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            emit(Piece::Literal("}"));
            rest = after;
        } else if let Some(after) = tail.strip_prefix('}') {
            // Stray closing brace stays literal.
            emit(Piece::Literal("}"));
            rest = after;
        } else {
            // A single '{'. A placeholder runs to the next brace, which
            // must be '}' and must not be empty; anything else is
            // literal text.
            let body = &tail[1..];
            match body.find(['{', '}']) {
                Some(end) if body.as_bytes()[end] == b'}' && end > 0 => {
                    emit(Piece::Placeholder(&body[..end]));
                    rest = &body[end + 1..];
                }
                Some(end) if body.as_bytes()[end] == b'}' => {
                    // "{}" has no name to look up.
                    emit(Piece::Literal("{}"));
                    rest = &body[end + 1..];
                }
                _ => {
                    emit(Piece::Literal("{"));
                    rest = body;
                }
            }
        }
    }
    if !rest.is_empty() {
        emit(Piece::Literal(rest));
    }
}

/// Substitution core. Returns the formatted string plus the supplied
/// variables the template never referenced (strict mode only; lenient
/// mode reports none).
fn substitute(
    template: &str,
    variables: &Record,
    policy: SubstitutionPolicy,
) -> Result<(String, Vec<String>), PipelineError> {
    let mut output = String::with_capacity(template.len());
    let mut missing: Option<String> = None;
    let mut used: Vec<&str> = Vec::new();

    scan(template, |piece| match piece {
        Piece::Literal(text) => output.push_str(text),
        Piece::Placeholder(name) => {
            if missing.is_some() {
                return;
            }
            if let Some(value) = variables.get(name) {
                output.push_str(&stringify(value));
                used.push(name);
            } else {
                match policy {
                    SubstitutionPolicy::Strict => missing = Some(name.to_string()),
                    SubstitutionPolicy::Lenient => {
                        output.push('{');
                        output.push_str(name);
                        output.push('}');
                    }
                }
            }
        }
    });

    if let Some(name) = missing {
        return Err(PipelineError::MissingVariable { name });
    }

    let unused = if policy == SubstitutionPolicy::Strict {
        variables
            .keys()
            .filter(|key| !used.contains(&key.as_str()))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    Ok((output, unused))
}

/// Renders a record field for interpolation. Strings drop their quotes;
/// other values use their JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
