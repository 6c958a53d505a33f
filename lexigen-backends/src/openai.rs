//! OpenAI backend.

use async_trait::async_trait;
use lexigen_core::config::ApiConfig;
use lexigen_core::{GenerateOptions, Generator, GeneratorError};

use crate::chat::{resolve_api_key, ChatClient, GenerationParams};

/// Default model when neither config nor caller specifies one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Generator backed by the OpenAI chat-completions API.
///
/// Owns its HTTP client and credentials. Credentials come from the
/// config `api.key` or the `OPENAI_API_KEY` environment variable;
/// their absence fails construction, never a call.
pub struct OpenAiGenerator {
    client: ChatClient,
}

impl OpenAiGenerator {
    /// Builds the backend from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Configuration`] when no API key is available
    /// or the configured model identifier is blank.
    pub fn from_config(config: &ApiConfig) -> Result<Self, GeneratorError> {
        let api_key = resolve_api_key(config.key.as_deref(), API_KEY_ENV)?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| BASE_URL.to_string());
        let params = GenerationParams::defaults(DEFAULT_MODEL).merged(config);
        Ok(Self {
            client: ChatClient::new(base_url, api_key, params)?,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, GeneratorError> {
        self.client.complete(prompt, options).await
    }
}
