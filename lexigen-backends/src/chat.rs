//! Shared chat-completions client and parameter merging.

use std::time::Duration;

use lexigen_core::config::ApiConfig;
use lexigen_core::{GenerateOptions, GeneratorError};
use serde::{Deserialize, Serialize};

/// Effective generation parameters for one backend.
///
/// Built from a backend's built-in defaults, overlaid with the
/// `[api]` config section, overlaid again per call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Model identifier.
    pub model: String,
    /// Maximum output length, in tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Call timeout.
    pub timeout: Duration,
}

impl GenerationParams {
    /// The built-in defaults every backend starts from, with the
    /// backend's own default model slug.
    #[must_use]
    pub fn defaults(model: &str) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }

    /// Overlays the config section onto these parameters.
    #[must_use]
    pub fn merged(mut self, config: &ApiConfig) -> Self {
        if let Some(model) = &config.model {
            self.model.clone_from(model);
        }
        if let Some(max_tokens) = config.params.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = config.params.temperature {
            self.temperature = temperature;
        }
        if let Some(timeout) = config.params.timeout {
            self.timeout = Duration::from_secs(timeout);
        }
        self
    }

    /// Overlays per-call options onto these parameters.
    #[must_use]
    pub fn with_options(&self, options: &GenerateOptions) -> Self {
        Self {
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            temperature: options.temperature.unwrap_or(self.temperature),
            timeout: options.timeout.unwrap_or(self.timeout),
        }
    }
}

/// Picks the API key: explicit configuration wins, then the backend's
/// environment variable. Blank values count as absent.
pub(crate) fn pick_api_key(
    configured: Option<&str>,
    env_value: Option<String>,
    env_var: &str,
) -> Result<String, GeneratorError> {
    configured
        .map(str::to_owned)
        .filter(|key| !key.trim().is_empty())
        .or_else(|| env_value.filter(|key| !key.trim().is_empty()))
        .ok_or_else(|| {
            GeneratorError::Configuration(format!(
                "API key not provided in config or {env_var} environment variable"
            ))
        })
}

/// Reads the API key from config, falling back to `env_var`.
pub(crate) fn resolve_api_key(
    configured: Option<&str>,
    env_var: &str,
) -> Result<String, GeneratorError> {
    pick_api_key(configured, std::env::var(env_var).ok(), env_var)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// One backend's connection to a chat-completions endpoint.
///
/// The HTTP client is constructed once and owned here; nothing is kept
/// in process-global state.
pub(crate) struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    params: GenerationParams,
}

impl ChatClient {
    pub(crate) fn new(
        base_url: String,
        api_key: String,
        params: GenerationParams,
    ) -> Result<Self, GeneratorError> {
        if params.model.trim().is_empty() {
            return Err(GeneratorError::Configuration(
                "model identifier is blank".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|error| GeneratorError::Configuration(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            api_key,
            params,
        })
    }

    /// Performs exactly one chat-completion call and returns the
    /// trimmed assistant text. An empty completion is an error.
    pub(crate) async fn complete(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, GeneratorError> {
        let params = self.params.with_options(options);
        let request = ChatRequest {
            model: &params.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %params.model, %url, "sending chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(params.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    GeneratorError::Call(format!(
                        "request timed out after {:?}",
                        params.timeout
                    ))
                } else {
                    GeneratorError::Call(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Call(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| GeneratorError::Call(format!("unparseable reply: {error}")))?;

        let content = parsed
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GeneratorError::EmptyCompletion);
        }
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigen_core::config::ApiParams;

    fn api_config(model: Option<&str>, max_tokens: Option<u32>) -> ApiConfig {
        ApiConfig {
            key: None,
            model: model.map(str::to_owned),
            base_url: None,
            params: ApiParams {
                max_tokens,
                temperature: None,
                timeout: None,
            },
        }
    }

    #[test]
    fn defaults_stand_without_config() {
        let params = GenerationParams::defaults("gpt-3.5-turbo").merged(&ApiConfig::default());
        assert_eq!(params.model, "gpt-3.5-turbo");
        assert_eq!(params.max_tokens, 1000);
        assert_eq!(params.timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_overrides_defaults() {
        let params = GenerationParams::defaults("gpt-3.5-turbo")
            .merged(&api_config(Some("gpt-4o"), Some(256)));
        assert_eq!(params.model, "gpt-4o");
        assert_eq!(params.max_tokens, 256);
        // Untouched fields keep their defaults.
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn per_call_options_override_config() {
        let base = GenerationParams::defaults("gpt-3.5-turbo")
            .merged(&api_config(Some("gpt-4o"), Some(256)));
        let options = GenerateOptions {
            model: Some("gpt-4o-mini".into()),
            max_tokens: None,
            temperature: Some(0.0),
            timeout: Some(Duration::from_secs(5)),
        };
        let effective = base.with_options(&options);
        assert_eq!(effective.model, "gpt-4o-mini");
        assert_eq!(effective.max_tokens, 256);
        assert!((effective.temperature - 0.0).abs() < f32::EPSILON);
        assert_eq!(effective.timeout, Duration::from_secs(5));
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let key = pick_api_key(Some("sk-config"), Some("sk-env".into()), "X_KEY").unwrap();
        assert_eq!(key, "sk-config");
    }

    #[test]
    fn environment_key_used_when_config_is_blank() {
        let key = pick_api_key(Some("   "), Some("sk-env".into()), "X_KEY").unwrap();
        assert_eq!(key, "sk-env");
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = pick_api_key(None, None, "X_KEY").unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration(_)));
        assert!(err.to_string().contains("X_KEY"));
    }

    #[test]
    fn blank_model_rejected_at_construction() {
        let mut params = GenerationParams::defaults("gpt-3.5-turbo");
        params.model = "  ".into();
        let err = ChatClient::new("https://example.test/v1".into(), "sk".into(), params)
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration(_)));
    }

    #[test]
    fn request_body_has_the_expected_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: [ChatMessage {
                role: "user",
                content: "Define run.",
            }],
            max_tokens: 100,
            temperature: 0.7,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Define run.");
        assert_eq!(body["max_tokens"], 100);
    }
}
