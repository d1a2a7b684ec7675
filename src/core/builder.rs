use std::marker::PhantomData;
use std::sync::Arc;

use crate::provider::{constants::sglang, sglang::SGLangModel};

use super::{
    error::LlmError, http::HttpClientConfig, prompt::AdditionalPrompt, retry::RetryConfig,
    retry::Sleeper,
};

pub struct Init;
pub struct Configuring;

/// Where the server's OpenAI-compatible base URL comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    /// Read from `SGLANG_API_URL`
    Default,
    /// Read from the named environment variable
    Env(String),
    /// Use this URL as is
    Custom(String),
}

impl BaseUrl {
    /// Resolve and validate the URL, stripping any trailing slash.
    pub fn resolve(&self) -> Result<String, LlmError> {
        let raw = match self {
            BaseUrl::Default => read_env(sglang::API_URL_ENV_VAR)?,
            BaseUrl::Env(name) => read_env(name)?,
            BaseUrl::Custom(url) => url.clone(),
        };

        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(LlmError::MissingConfiguration(
                "Endpoint base URL is empty".to_string(),
            ));
        }

        let parsed = reqwest::Url::parse(trimmed).map_err(|e| {
            LlmError::MissingConfiguration(format!("Invalid endpoint base URL '{trimmed}': {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LlmError::MissingConfiguration(format!(
                "Endpoint base URL '{trimmed}' must use http or https"
            )));
        }

        Ok(trimmed.to_string())
    }
}

fn read_env(name: &str) -> Result<String, LlmError> {
    std::env::var(name)
        .map_err(|_| LlmError::MissingConfiguration(format!("{name} is not set")))
}

/// Bearer token sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKey {
    /// `OPENAI_API_KEY` when set, otherwise no key
    Default,
    Custom(String),
    None,
}

impl ApiKey {
    pub fn resolve(&self) -> Option<String> {
        match self {
            ApiKey::Default => std::env::var(sglang::API_KEY_ENV_VAR)
                .ok()
                .filter(|key| !key.is_empty()),
            ApiKey::Custom(key) => Some(key.clone()),
            ApiKey::None => None,
        }
    }
}

pub struct ModelBuilder<State> {
    model: Option<String>,
    max_tokens: u32,
    temperature: f32,
    additional_prompt: Option<AdditionalPrompt>,
    is_instruct_model: bool,
    base_url: BaseUrl,
    api_key: ApiKey,
    http_config: HttpClientConfig,
    retry_config: RetryConfig,
    sleeper: Option<Arc<dyn Sleeper>>,
    _state: PhantomData<State>,
}

impl<State> ModelBuilder<State> {
    pub(crate) fn get_model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub(crate) fn get_max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub(crate) fn get_temperature(&self) -> f32 {
        self.temperature
    }

    pub(crate) fn get_additional_prompt(&self) -> Option<AdditionalPrompt> {
        self.additional_prompt
    }

    pub(crate) fn get_is_instruct_model(&self) -> bool {
        self.is_instruct_model
    }

    pub(crate) fn get_base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub(crate) fn get_api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub(crate) fn get_http_config(&self) -> &HttpClientConfig {
        &self.http_config
    }

    pub(crate) fn get_retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    pub(crate) fn get_sleeper(&self) -> Option<Arc<dyn Sleeper>> {
        self.sleeper.clone()
    }
}

impl ModelBuilder<Init> {
    pub fn model(self, model_id: impl Into<String>) -> ModelBuilder<Configuring> {
        ModelBuilder {
            model: Some(model_id.into()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            additional_prompt: self.additional_prompt,
            is_instruct_model: self.is_instruct_model,
            base_url: self.base_url,
            api_key: self.api_key,
            http_config: self.http_config,
            retry_config: self.retry_config,
            sleeper: self.sleeper,
            _state: PhantomData,
        }
    }
}

impl ModelBuilder<Configuring> {
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn additional_prompt(mut self, additional_prompt: AdditionalPrompt) -> Self {
        self.additional_prompt = Some(additional_prompt);
        self
    }

    /// Force chat requests regardless of the model id.
    pub fn instruct(mut self, is_instruct_model: bool) -> Self {
        self.is_instruct_model = is_instruct_model;
        self
    }

    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn api_key(mut self, api_key: ApiKey) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Convenience for setting only the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http_config.timeout = timeout;
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Resolve the endpoint and build the client.
    ///
    /// Fails when the base URL cannot be resolved or the defaults are out of range.
    pub fn build(self) -> Result<SGLangModel, LlmError> {
        crate::provider::sglang::create_sglang_model_from_builder(&self)
    }
}

pub mod lm {
    use super::*;

    pub fn builder() -> ModelBuilder<Init> {
        ModelBuilder {
            model: None,
            max_tokens: sglang::DEFAULT_MAX_TOKENS,
            temperature: sglang::DEFAULT_TEMPERATURE,
            additional_prompt: None,
            is_instruct_model: false,
            base_url: BaseUrl::Default,
            api_key: ApiKey::Default,
            http_config: HttpClientConfig::default(),
            retry_config: RetryConfig::default(),
            sleeper: None,
            _state: PhantomData,
        }
    }

    /// Shorthand for `builder().model(model_id)`.
    pub fn model(model_id: impl Into<String>) -> ModelBuilder<Configuring> {
        builder().model(model_id)
    }
}
