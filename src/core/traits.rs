use async_trait::async_trait;

use super::{
    error::LlmError,
    prompt::Prompt,
    types::{GenerateOptions, GenerateOutput},
};

/// Common surface of a language model backend used by search and reasoning code.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate one or more continuations of a single prompt.
    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerateOptions,
    ) -> Result<GenerateOutput, LlmError>;

    /// Logits of the next token restricted to `candidates`.
    async fn get_next_token_logits(
        &self,
        prompt: Prompt,
        candidates: Vec<String>,
    ) -> Result<Vec<Vec<f64>>, LlmError>;

    /// Normalized log-likelihood of each `contents` entry given `prefix`.
    ///
    /// Every entry must start with `prefix`.
    async fn get_loglikelihood(
        &self,
        prefix: &str,
        contents: &[String],
    ) -> Result<Vec<f64>, LlmError>;
}
