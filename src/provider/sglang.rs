//! Client for an SGLang server.
//!
//! Generation goes through the OpenAI-compatible `/v1` API; log-likelihood
//! scoring goes through the native `/generate` endpoint at the server root.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::{
    AdditionalPrompt, GenerateOptions, GenerateOutput, HttpClient, HttpClientConfig,
    LanguageModel, LlmError, Message, ModelBuilder, Prompt, RequestMode, RetryConfig,
    RetryPolicy, Sleeper, TokioSleeper,
    builder::Configuring,
    types::{ChoiceScore, Selection},
};
use crate::provider::constants::sglang;
use crate::wire::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionRequest, CompletionResponse,
    GenerateRequest, GenerateResponse,
};

/// Endpoint handle and transport settings
#[derive(Debug, Clone)]
pub struct SGLangConfig {
    /// OpenAI-compatible base URL, e.g. `http://127.0.0.1:30000/v1`
    pub base_url: String,
    pub api_key: Option<String>,
    pub http_config: HttpClientConfig,
    pub retry_config: RetryConfig,
}

impl SGLangConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http_config: HttpClientConfig::default(),
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}{}", self.base_url, sglang::CHAT_COMPLETIONS_ENDPOINT)
    }

    pub fn completions_url(&self) -> String {
        format!("{}{}", self.base_url, sglang::COMPLETIONS_ENDPOINT)
    }

    /// `scheme://host[:port]` of the base URL; the native API lives there.
    pub fn server_root(&self) -> Result<String, LlmError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            LlmError::ProviderConfiguration(format!("Invalid base URL '{}': {e}", self.base_url))
        })?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(LlmError::ProviderConfiguration(format!(
                "Base URL '{}' has no host",
                self.base_url
            )));
        }
        Ok(origin.ascii_serialization())
    }

    pub fn generate_url(&self) -> Result<String, LlmError> {
        Ok(format!("{}{}", self.server_root()?, sglang::GENERATE_ENDPOINT))
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.api_key
            .as_ref()
            .map(|key| ("Authorization".to_string(), format!("Bearer {key}")))
            .into_iter()
            .collect()
    }
}

/// Language model served by SGLang.
///
/// Holds configuration only; every call is independent, so one instance can
/// be shared across tasks.
pub struct SGLangModel {
    model: String,
    max_tokens: u32,
    temperature: f32,
    additional_prompt: Option<AdditionalPrompt>,
    mode: RequestMode,
    config: SGLangConfig,
    http: HttpClient,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for SGLangModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SGLangModel")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("additional_prompt", &self.additional_prompt)
            .field("mode", &self.mode)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl SGLangModel {
    /// Client for `model` with the adapter defaults (2048 tokens, temperature 0,
    /// instruct-ness inferred from the model id).
    pub fn new(model: impl Into<String>, config: SGLangConfig) -> Result<Self, LlmError> {
        let model = model.into();
        let http = HttpClient::new(&config.http_config, None)?;
        config.server_root()?;

        Ok(Self {
            mode: RequestMode::classify(&model, false),
            model,
            max_tokens: sglang::DEFAULT_MAX_TOKENS,
            temperature: sglang::DEFAULT_TEMPERATURE,
            additional_prompt: None,
            config,
            http,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_additional_prompt(mut self, additional_prompt: AdditionalPrompt) -> Self {
        self.additional_prompt = Some(additional_prompt);
        self
    }

    /// Mark the model as instruction-tuned so it always gets chat requests.
    pub fn with_instruct(mut self, is_instruct_model: bool) -> Self {
        self.mode = RequestMode::classify(&self.model, is_instruct_model);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn config(&self) -> &SGLangConfig {
        &self.config
    }

    fn validate_defaults(&self) -> Result<(), LlmError> {
        if self.max_tokens == 0 {
            return Err(LlmError::ProviderConfiguration(
                "default max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.temperature.is_nan() || self.temperature < 0.0 {
            return Err(LlmError::ProviderConfiguration(format!(
                "default temperature must be non-negative, got {}",
                self.temperature
            )));
        }
        self.config
            .retry_config
            .validate()
            .map_err(|e| LlmError::ProviderConfiguration(e.to_string()))
    }

    fn retry_config_for(&self, options: &GenerateOptions) -> RetryConfig {
        let defaults = &self.config.retry_config;
        RetryConfig {
            max_attempts: options.retry.unwrap_or(defaults.max_attempts),
            rate_limit_per_min: options
                .rate_limit_per_min
                .resolve(defaults.rate_limit_per_min),
        }
    }

    fn shape_prompt(&self, prompt: String, requested: Option<AdditionalPrompt>) -> String {
        let (wrap, overridden) = AdditionalPrompt::resolve(self.additional_prompt, requested);
        if overridden {
            warn!(
                configured = ?self.additional_prompt,
                requested = ?requested,
                "additional_prompt set in constructor is overridden"
            );
        }
        match wrap {
            Some(wrap) => wrap.apply(&prompt),
            None => prompt,
        }
    }

    async fn chat_once(&self, request: &ChatCompletionRequest) -> Result<GenerateOutput, LlmError> {
        let response: ChatCompletionResponse = self
            .http
            .post_json(&self.config.chat_completions_url(), &self.config.headers(), request)
            .await?;

        let first = response.choices.first().ok_or(LlmError::EmptyResponse)?;
        let log_prob = vec![first.token_logprobs()];
        let text = response
            .choices
            .into_iter()
            .map(|choice| choice.message.content.unwrap_or_default())
            .collect();

        Ok(GenerateOutput { text, log_prob })
    }

    async fn completion_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<GenerateOutput, LlmError> {
        let response: CompletionResponse = self
            .http
            .post_json(&self.config.completions_url(), &self.config.headers(), request)
            .await?;

        if response.choices.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let log_prob = response
            .choices
            .iter()
            .map(|choice| choice.token_logprobs())
            .collect();
        let text = response
            .choices
            .into_iter()
            .map(|choice| choice.text)
            .collect();

        Ok(GenerateOutput { text, log_prob })
    }

    /// Score each choice as a continuation of `prefix`.
    ///
    /// Scores are paired with choices by position in the server's batch
    /// reply; a reply of the wrong length is rejected rather than guessed at.
    #[tracing::instrument(
        name = "score_choices",
        skip(self, prefix, choices),
        fields(model = %self.model, choices = choices.len()),
        err
    )]
    pub async fn score_choices(
        &self,
        prefix: &str,
        choices: &[String],
    ) -> Result<Vec<ChoiceScore>, LlmError> {
        if choices.is_empty() {
            return Err(LlmError::InvalidInput(
                "At least one choice is required for scoring".to_string(),
            ));
        }

        let url = self.config.generate_url()?;
        let headers = self.config.headers();

        let primed: GenerateResponse = self
            .http
            .post_json(&url, &headers, &GenerateRequest::prime(prefix))
            .await?;
        let logprob_start_len = primed.meta_info.prompt_tokens.saturating_sub(2);
        debug!(
            prompt_tokens = primed.meta_info.prompt_tokens,
            logprob_start_len, "Primed scoring prefix"
        );

        let scored: Vec<GenerateResponse> = self
            .http
            .post_json(
                &url,
                &headers,
                &GenerateRequest::score(prefix, choices, logprob_start_len),
            )
            .await?;

        if scored.len() != choices.len() {
            return Err(LlmError::Api {
                message: format!(
                    "Scoring returned {} results for {} choices",
                    scored.len(),
                    choices.len()
                ),
                status_code: None,
            });
        }

        choices
            .iter()
            .zip(scored)
            .map(|(choice, result)| {
                let normalized_logprob =
                    result.meta_info.normalized_logprob().ok_or_else(|| LlmError::Api {
                        message: format!("Scoring result for '{choice}' has no prompt logprobs"),
                        status_code: None,
                    })?;
                Ok(ChoiceScore {
                    choice: choice.clone(),
                    normalized_logprob,
                })
            })
            .collect()
    }

    /// Pick the choice with the highest normalized logprob. Ties go to the earliest choice.
    pub async fn select(&self, prefix: &str, choices: &[String]) -> Result<Selection, LlmError> {
        let scores = self.score_choices(prefix, choices).await?;

        let mut index = 0;
        for (i, score) in scores.iter().enumerate() {
            if score.normalized_logprob > scores[index].normalized_logprob {
                index = i;
            }
        }

        Ok(Selection {
            choice: scores[index].choice.clone(),
            index,
            scores,
        })
    }
}

/// Strip `prefix` from every content string and trim the remainder.
pub fn extract_actions(prefix: &str, contents: &[String]) -> Result<Vec<String>, LlmError> {
    contents
        .iter()
        .map(|content| {
            content
                .strip_prefix(prefix)
                .map(|action| action.trim().to_string())
                .ok_or_else(|| {
                    LlmError::InvalidInput(format!("'{prefix}' is not a prefix of '{content}'"))
                })
        })
        .collect()
}

#[async_trait]
impl LanguageModel for SGLangModel {
    #[tracing::instrument(
        name = "generate",
        skip(self, prompt, options),
        fields(model = %self.model, mode = ?self.mode),
        err
    )]
    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerateOptions,
    ) -> Result<GenerateOutput, LlmError> {
        let prompt = prompt.into_single()?;
        options.validate()?;
        self.validate_defaults()?;

        let prompt = self.shape_prompt(prompt, options.additional_prompt);
        let retry_config = self.retry_config_for(&options);
        let policy = RetryPolicy::new(&retry_config, self.sleeper.as_ref());

        let max_tokens = options.max_tokens.unwrap_or(self.max_tokens);
        let temperature = options.temperature.unwrap_or(self.temperature);

        match self.mode {
            RequestMode::Chat => {
                let request = ChatCompletionRequest {
                    model: self.model.clone(),
                    messages: vec![Message::user(prompt)],
                    max_tokens,
                    temperature,
                    top_p: options.top_p,
                    n: options.num_return_sequences,
                    stop: options.stop,
                    logprobs: true,
                    top_logprobs: (options.logprobs > 0).then_some(options.logprobs),
                    extra: options.extra,
                };
                policy.run(|_| self.chat_once(&request)).await
            }
            RequestMode::Completion => {
                let request = CompletionRequest {
                    model: self.model.clone(),
                    prompt,
                    max_tokens,
                    temperature,
                    top_p: options.top_p,
                    n: options.num_return_sequences,
                    stop: options.stop,
                    logprobs: options.logprobs,
                    extra: options.extra,
                };
                policy.run(|_| self.completion_once(&request)).await
            }
        }
    }

    async fn get_next_token_logits(
        &self,
        _prompt: Prompt,
        _candidates: Vec<String>,
    ) -> Result<Vec<Vec<f64>>, LlmError> {
        Err(LlmError::Unsupported(
            "SGLangModel does not support get_next_token_logits".to_string(),
        ))
    }

    async fn get_loglikelihood(
        &self,
        prefix: &str,
        contents: &[String],
    ) -> Result<Vec<f64>, LlmError> {
        let actions = extract_actions(prefix, contents)?;
        let scores = self.score_choices(prefix, &actions).await?;
        Ok(scores.into_iter().map(|s| s.normalized_logprob).collect())
    }
}

pub fn create_sglang_model_from_builder(
    builder: &ModelBuilder<Configuring>,
) -> Result<SGLangModel, LlmError> {
    let model = builder
        .get_model()
        .ok_or_else(|| LlmError::ProviderConfiguration("Model not set".to_string()))?
        .to_string();

    let base_url = builder.get_base_url().resolve()?;

    let mut config = SGLangConfig::new(base_url)
        .with_http_config(builder.get_http_config().clone())
        .with_retry_config(builder.get_retry_config().clone());
    if let Some(api_key) = builder.get_api_key().resolve() {
        config = config.with_api_key(api_key);
    }

    let mut client = SGLangModel::new(model, config)?
        .with_max_tokens(builder.get_max_tokens())
        .with_temperature(builder.get_temperature())
        .with_instruct(builder.get_is_instruct_model());
    if let Some(additional_prompt) = builder.get_additional_prompt() {
        client = client.with_additional_prompt(additional_prompt);
    }
    if let Some(sleeper) = builder.get_sleeper() {
        client = client.with_sleeper(sleeper);
    }

    client.validate_defaults()?;
    Ok(client)
}
