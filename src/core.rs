pub mod builder;
pub mod error;
pub mod http;
pub mod prompt;
pub mod retry;
pub mod traits;
pub mod types;

pub use builder::{ApiKey, BaseUrl, ModelBuilder, lm};
pub use error::LlmError;
pub use http::{HttpClient, HttpClientConfig};
pub use prompt::{AdditionalPrompt, Prompt};
pub use retry::{RetryConfig, RetryPolicy, Sleeper, TokioSleeper};
pub use traits::LanguageModel;
pub use types::{
    ChatRole, ChoiceScore, GenerateOptions, GenerateOptionsBuilder, GenerateOutput, Message,
    RateLimit, RequestMode, Selection,
};
