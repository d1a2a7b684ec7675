//! Response bodies of the OpenAI-compatible endpoints.
//!
//! Fields the client does not read are still declared so that debug output of
//! a decoded response is complete.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub logprobs: Option<ChatLogProbs>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,
    /// `null` when the model produced no text
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatLogProbs {
    #[serde(default)]
    pub content: Option<Vec<ChatTokenLogProb>>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct ChatTokenLogProb {
    pub token: String,
    pub logprob: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct CompletionChoice {
    pub text: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub logprobs: Option<CompletionLogProbs>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct CompletionLogProbs {
    #[serde(default)]
    pub tokens: Vec<String>,
    /// `null` for positions the server could not score (e.g. the first echoed token)
    #[serde(default)]
    pub token_logprobs: Vec<Option<f64>>,
}

impl ChatChoice {
    pub fn token_logprobs(&self) -> Vec<f64> {
        self.logprobs
            .as_ref()
            .and_then(|lp| lp.content.as_ref())
            .map(|tokens| tokens.iter().map(|t| t.logprob).collect())
            .unwrap_or_default()
    }
}

impl CompletionChoice {
    pub fn token_logprobs(&self) -> Vec<f64> {
        self.logprobs
            .as_ref()
            .map(|lp| lp.token_logprobs.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}
