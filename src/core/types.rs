use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::LlmError;
use super::prompt::AdditionalPrompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Request shape used against the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// `/chat/completions` with a single user turn
    Chat,
    /// `/completions` with the raw prompt
    Completion,
}

impl RequestMode {
    /// Instruction-tuned models get chat requests. A model counts as
    /// instruction-tuned when flagged explicitly or when its id contains
    /// "instruct" in any case.
    pub fn classify(model: &str, is_instruct_model: bool) -> Self {
        if is_instruct_model || model.to_lowercase().contains("instruct") {
            RequestMode::Chat
        } else {
            RequestMode::Completion
        }
    }
}

/// Uniform result of a generation call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateOutput {
    /// One entry per returned choice, in server order.
    pub text: Vec<String>,
    /// Per-token log-probabilities.
    ///
    /// Completion requests yield one sequence per choice. Chat requests
    /// yield a single sequence for the first choice.
    pub log_prob: Vec<Vec<f64>>,
}

/// Normalized log-probability the server assigned to one candidate continuation
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceScore {
    pub choice: String,
    pub normalized_logprob: f64,
}

/// Outcome of picking the most likely continuation among candidates
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub choice: String,
    pub index: usize,
    pub scores: Vec<ChoiceScore>,
}

/// Pacing override for a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimit {
    /// Use the model's [`crate::RetryConfig::rate_limit_per_min`]
    #[default]
    Default,
    /// No pacing delay
    Disabled,
    PerMin(u32),
}

impl RateLimit {
    pub fn resolve(self, default: Option<u32>) -> Option<u32> {
        match self {
            RateLimit::Default => default,
            RateLimit::Disabled => None,
            RateLimit::PerMin(rate) => Some(rate),
        }
    }
}

impl From<Option<u32>> for RateLimit {
    fn from(rate: Option<u32>) -> Self {
        match rate {
            Some(rate) => RateLimit::PerMin(rate),
            None => RateLimit::Disabled,
        }
    }
}

/// Per-call overrides for [`crate::LanguageModel::generate`].
///
/// Unset fields fall back to the model's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: f32,
    pub num_return_sequences: u32,
    pub rate_limit_per_min: RateLimit,
    pub stop: Option<String>,
    /// Number of top alternatives to request per token; 0 returns only the sampled token's logprob.
    pub logprobs: u32,
    pub additional_prompt: Option<AdditionalPrompt>,
    pub retry: Option<u32>,
    /// Extra fields merged into the request body.
    pub extra: Map<String, Value>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: None,
            top_p: 1.0,
            num_return_sequences: 1,
            rate_limit_per_min: RateLimit::Default,
            stop: None,
            logprobs: 0,
            additional_prompt: None,
            retry: None,
            extra: Map::new(),
        }
    }
}

impl GenerateOptions {
    pub fn new() -> GenerateOptionsBuilder {
        GenerateOptionsBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<(), LlmError> {
        if self.max_tokens == Some(0) {
            return Err(LlmError::InvalidInput(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if let Some(temperature) = self.temperature
            && (temperature.is_nan() || temperature < 0.0)
        {
            return Err(LlmError::InvalidInput(format!(
                "temperature must be non-negative, got {temperature}"
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(LlmError::InvalidInput(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }
        if self.num_return_sequences == 0 {
            return Err(LlmError::InvalidInput(
                "num_return_sequences must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct GenerateOptionsBuilder {
    options: GenerateOptions,
}

impl GenerateOptionsBuilder {
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.options.top_p = top_p;
        self
    }

    pub fn num_return_sequences(mut self, n: u32) -> Self {
        self.options.num_return_sequences = n;
        self
    }

    /// Requests per minute for this call; `None` disables pacing.
    pub fn rate_limit_per_min(mut self, rate: Option<u32>) -> Self {
        self.options.rate_limit_per_min = RateLimit::from(rate);
        self
    }

    pub fn stop(mut self, stop: impl Into<String>) -> Self {
        self.options.stop = Some(stop.into());
        self
    }

    pub fn logprobs(mut self, logprobs: u32) -> Self {
        self.options.logprobs = logprobs;
        self
    }

    pub fn additional_prompt(mut self, additional_prompt: AdditionalPrompt) -> Self {
        self.options.additional_prompt = Some(additional_prompt);
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.options.retry = Some(retry);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> GenerateOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruct_models_are_detected_case_insensitively() {
        assert_eq!(
            RequestMode::classify("meta-llama/Llama-3.1-8B-Instruct", false),
            RequestMode::Chat
        );
        assert_eq!(RequestMode::classify("qwen-INSTRUCT", false), RequestMode::Chat);
        assert_eq!(
            RequestMode::classify("meta-llama/Llama-3.1-8B", false),
            RequestMode::Completion
        );
        assert_eq!(RequestMode::classify("meta-llama/Llama-3.1-8B", true), RequestMode::Chat);
    }

    #[test]
    fn options_builder_sets_overrides() {
        let options = GenerateOptions::new()
            .max_tokens(64)
            .temperature(0.7)
            .top_p(0.9)
            .num_return_sequences(3)
            .rate_limit_per_min(None)
            .stop("\n")
            .retry(2)
            .build();

        assert_eq!(options.max_tokens, Some(64));
        assert_eq!(options.num_return_sequences, 3);
        assert_eq!(options.rate_limit_per_min, RateLimit::Disabled);
        assert_eq!(options.stop.as_deref(), Some("\n"));
        assert_eq!(options.retry, Some(2));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rate_limit_override_resolves_against_model_default() {
        assert_eq!(RateLimit::Default.resolve(Some(20)), Some(20));
        assert_eq!(RateLimit::Disabled.resolve(Some(20)), None);
        assert_eq!(RateLimit::PerMin(60).resolve(None), Some(60));
        assert_eq!(RateLimit::from(Some(30)), RateLimit::PerMin(30));
        assert_eq!(GenerateOptions::default().rate_limit_per_min, RateLimit::Default);
    }

    #[test]
    fn options_reject_out_of_range_values() {
        let bad = [
            GenerateOptions::new().max_tokens(0).build(),
            GenerateOptions::new().temperature(-0.1).build(),
            GenerateOptions::new().temperature(f32::NAN).build(),
            GenerateOptions::new().top_p(1.5).build(),
            GenerateOptions::new().num_return_sequences(0).build(),
        ];
        for options in bad {
            assert!(
                matches!(options.validate(), Err(LlmError::InvalidInput(_))),
                "{options:?} should be rejected"
            );
        }
    }
}
