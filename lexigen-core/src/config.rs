//! Pipeline and backend configuration structures.
//!
//! These deserialize from the YAML config file the batch driver loads.
//! Every field is defaulted so a minimal config only needs the prompt
//! path; credentials absent here fall back to the backend's
//! environment variable and otherwise fail construction.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::format::SubstitutionPolicy;
use crate::handler::{BackoffStrategy, RetryPolicy};

/// Top-level configuration for one enrichment run.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineConfig {
    /// Path to the prompt template file.
    #[serde(default = "default_prompt_path")]
    pub prompt_path: PathBuf,

    /// How substitution treats missing placeholders.
    #[serde(default)]
    pub substitution: SubstitutionPolicy,

    /// Retry behavior.
    #[serde(default)]
    pub handler: HandlerConfig,

    /// Backend connection and generation parameters.
    #[serde(default)]
    pub api: ApiConfig,

    /// Validator settings.
    #[serde(default)]
    pub validators: ValidatorsConfig,
}

fn default_prompt_path() -> PathBuf {
    PathBuf::from("prompt.md")
}

/// Retry settings for the generation handler.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    /// Maximum generate→extract→validate cycles per record.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Constant backoff between attempts, in seconds.
    #[serde(default = "default_sleep_time")]
    pub sleep_time: u64,
}

const fn default_max_attempts() -> usize {
    3
}

const fn default_sleep_time() -> u64 {
    2
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            sleep_time: default_sleep_time(),
        }
    }
}

impl HandlerConfig {
    /// Converts the config into the pipeline's retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: BackoffStrategy::Constant(Duration::from_secs(self.sleep_time)),
            deadline: None,
        }
    }
}

/// Backend connection settings and generation parameter overrides.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiConfig {
    /// API key; when absent the backend's environment variable is used.
    #[serde(default)]
    pub key: Option<String>,

    /// Model identifier; backends supply a default when absent.
    #[serde(default)]
    pub model: Option<String>,

    /// Endpoint base URL override.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Generation parameter overrides.
    #[serde(default)]
    pub params: ApiParams,
}

/// Generation parameters layered over a backend's built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiParams {
    /// Maximum output length, in tokens.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Call timeout, in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Validator settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ValidatorsConfig {
    /// JSON/schema validator settings.
    #[serde(default)]
    pub json: JsonValidatorConfig,
}

/// Settings for the schema validator.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct JsonValidatorConfig {
    /// When set, a missing or unreadable schema is a construction-time
    /// failure and validation without a schema always rejects.
    #[serde(default)]
    pub require_schema: bool,

    /// Path to a JSON Schema document.
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.prompt_path, PathBuf::from("prompt.md"));
        assert_eq!(config.substitution, SubstitutionPolicy::Strict);
        assert_eq!(config.handler.max_attempts, 3);
        assert_eq!(config.handler.sleep_time, 2);
        assert!(config.api.key.is_none());
        assert!(!config.validators.json.require_schema);
    }

    #[test]
    fn retry_policy_reflects_handler_settings() {
        let handler = HandlerConfig {
            max_attempts: 5,
            sleep_time: 1,
        };
        let policy = handler.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(
            policy.backoff,
            BackoffStrategy::Constant(Duration::from_secs(1))
        );
    }

    #[test]
    fn full_config_deserializes() {
        let json = serde_json::json!({
            "prompt_path": "prompts/define.md",
            "substitution": "lenient",
            "handler": {"max_attempts": 4, "sleep_time": 0},
            "api": {
                "key": "sk-test",
                "model": "gpt-4o-mini",
                "params": {"max_tokens": 500, "temperature": 0.2, "timeout": 15}
            },
            "validators": {"json": {"require_schema": true, "schema_path": "schema.json"}}
        });
        let config: PipelineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.substitution, SubstitutionPolicy::Lenient);
        assert_eq!(config.handler.max_attempts, 4);
        assert_eq!(config.api.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.api.params.max_tokens, Some(500));
        assert!(config.validators.json.require_schema);
    }
}
