//! # sglang-lm
//!
//! Completion and log-likelihood client for SGLang and other OpenAI-compatible inference servers.
//!
//! The server is located through `SGLANG_API_URL` (for example `http://127.0.0.1:30000/v1`).
//! Instruction-tuned models (explicitly flagged, or with "instruct" in the model id) are
//! queried through `/chat/completions`, everything else through `/completions`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sglang_lm::{lm, AdditionalPrompt, GenerateOptions, LanguageModel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = lm::model("meta-llama/Llama-3.1-8B-Instruct")
//!         .additional_prompt(AdditionalPrompt::Answer)
//!         .build()?;
//!
//!     let output = model
//!         .generate(
//!             "How to go to Shanghai from Beijing?".into(),
//!             GenerateOptions::new().max_tokens(256).build(),
//!         )
//!         .await?;
//!     println!("{}", output.text[0]);
//!
//!     let scores = model
//!         .get_loglikelihood(
//!             "Q: why is the grass wet? A:",
//!             &[
//!                 "Q: why is the grass wet? A: because it rains".to_string(),
//!                 "Q: why is the grass wet? A: because it is sunny".to_string(),
//!             ],
//!         )
//!         .await?;
//!     println!("{scores:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! Every generation attempt is paced by `60 / rate_limit_per_min` seconds (20 per minute by
//! default). Transient failures back off linearly, 1s, 2s, 3s, ..., up to 64 attempts, after
//! which the call fails with [`LlmError::RetriesExhausted`]. Client errors such as a rejected
//! API key are not retried.

pub mod core;
pub mod provider;
mod wire;

pub use crate::core::{
    AdditionalPrompt, ApiKey, BaseUrl, ChatRole, ChoiceScore, GenerateOptions,
    GenerateOptionsBuilder, GenerateOutput, HttpClientConfig, LanguageModel, LlmError, Message,
    ModelBuilder, Prompt, RateLimit, RequestMode, RetryConfig, Selection, Sleeper, TokioSleeper, lm,
};
pub use crate::provider::{SGLangConfig, SGLangModel, sglang::extract_actions};
