//! Nebius AI Studio backend.
//!
//! Nebius exposes an OpenAI-compatible `/chat/completions` endpoint,
//! so this backend reuses the shared chat client with a different
//! host, credential source, and default model slug.

use async_trait::async_trait;
use lexigen_core::config::ApiConfig;
use lexigen_core::{GenerateOptions, Generator, GeneratorError};

use crate::chat::{resolve_api_key, ChatClient, GenerationParams};

/// Default model slug on Nebius AI Studio.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3-0324";

const BASE_URL: &str = "https://api.studio.nebius.ai/v1";
const API_KEY_ENV: &str = "NEBIUS_API_KEY";

/// Generator backed by Nebius AI Studio.
pub struct NebiusGenerator {
    client: ChatClient,
}

impl NebiusGenerator {
    /// Builds the backend from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Configuration`] when no API key is available
    /// (config `api.key` or `NEBIUS_API_KEY`) or the model identifier
    /// is blank.
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
impl Generator for NebiusGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, GeneratorError> {
        self.client.complete(prompt, options).await
    }
}
