use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::Message;

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,

    pub messages: Vec<Message>,

    pub max_tokens: u32,

    pub temperature: f32,

    pub top_p: f32,

    pub n: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,

    pub logprobs: bool,

    /// An integer between 0 and 20
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,

    pub prompt: String,

    pub max_tokens: u32,

    pub temperature: f32,

    pub top_p: f32,

    pub n: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,

    /// Number of most likely alternatives to include per token; 0 keeps only the sampled token.
    pub logprobs: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
