//! SGLang's native `/generate` endpoint, used for prompt scoring.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GenerateText {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl SamplingParams {
    /// Prefill only; nothing is generated.
    pub fn prefill_only() -> Self {
        Self {
            max_new_tokens: 0,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub text: GenerateText,

    pub sampling_params: SamplingParams,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_logprob: Option<bool>,

    /// First prompt position whose logprob is reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprob_start_len: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_text_in_logprobs: Option<bool>,
}

impl GenerateRequest {
    /// Prefill `prefix` to learn its token count (and warm the prefix cache).
    pub fn prime(prefix: &str) -> Self {
        Self {
            text: GenerateText::One(prefix.to_string()),
            sampling_params: SamplingParams::prefill_only(),
            return_logprob: None,
            logprob_start_len: None,
            return_text_in_logprobs: None,
        }
    }

    /// Score every `prefix + choice` text from `logprob_start_len` onwards.
    pub fn score(prefix: &str, choices: &[String], logprob_start_len: usize) -> Self {
        Self {
            text: GenerateText::Many(choices.iter().map(|c| format!("{prefix}{c}")).collect()),
            sampling_params: SamplingParams::prefill_only(),
            return_logprob: Some(true),
            logprob_start_len: Some(logprob_start_len),
            return_text_in_logprobs: Some(true),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct GenerateResponse {
    #[serde(default)]
    pub text: String,
    pub meta_info: MetaInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaInfo {
    #[serde(default)]
    pub prompt_tokens: usize,

    #[serde(default)]
    pub normalized_prompt_logprob: Option<f64>,

    /// Entries look like `[logprob, token_id, token_text]`; the logprob of the
    /// first prompt token is `null`.
    #[serde(default)]
    pub input_token_logprobs: Option<Vec<Vec<Value>>>,
}

impl MetaInfo {
    /// Length-normalized prompt logprob.
    ///
    /// Falls back to the mean of the reported input token logprobs when the
    /// server does not send the normalized value itself.
    pub fn normalized_logprob(&self) -> Option<f64> {
        if let Some(score) = self.normalized_prompt_logprob {
            return Some(score);
        }

        let logprobs: Vec<f64> = self
            .input_token_logprobs
            .as_ref()?
            .iter()
            .filter_map(|entry| entry.first().and_then(Value::as_f64))
            .collect();

        if logprobs.is_empty() {
            None
        } else {
            Some(logprobs.iter().sum::<f64>() / logprobs.len() as f64)
        }
    }
}
