//! Prompt input and the fixed instructional wrappers.

use std::fmt;
use std::str::FromStr;

use super::error::LlmError;

pub const PROMPT_TEMPLATE_ANSWER: &str = "Your response need to be ended with \"So the answer is\"\n\n";
pub const PROMPT_TEMPLATE_CONTINUE: &str = "Please continue to answer the last question, following the format of previous examples. Don't say any other words.\n\n";

/// Instructional prefix prepended to the prompt before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalPrompt {
    /// Ask the model to finish with "So the answer is".
    Answer,
    /// Ask the model to continue in the format of the few-shot examples.
    Continue,
}

impl AdditionalPrompt {
    pub fn template(&self) -> &'static str {
        match self {
            AdditionalPrompt::Answer => PROMPT_TEMPLATE_ANSWER,
            AdditionalPrompt::Continue => PROMPT_TEMPLATE_CONTINUE,
        }
    }

    pub fn apply(&self, prompt: &str) -> String {
        format!("{}{}", self.template(), prompt)
    }

    /// Pick the wrapper for one call. A call-time mode wins over the one the
    /// model was built with; the flag reports whether an override happened.
    pub fn resolve(
        configured: Option<AdditionalPrompt>,
        requested: Option<AdditionalPrompt>,
    ) -> (Option<AdditionalPrompt>, bool) {
        match (configured, requested) {
            (Some(_), Some(requested)) => (Some(requested), true),
            (configured, None) => (configured, false),
            (None, requested) => (requested, false),
        }
    }
}

impl fmt::Display for AdditionalPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdditionalPrompt::Answer => write!(f, "ANSWER"),
            AdditionalPrompt::Continue => write!(f, "CONTINUE"),
        }
    }
}

impl FromStr for AdditionalPrompt {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANSWER" => Ok(AdditionalPrompt::Answer),
            "CONTINUE" => Ok(AdditionalPrompt::Continue),
            other => Err(LlmError::InvalidInput(format!(
                "Unknown additional prompt '{other}', expected ANSWER or CONTINUE"
            ))),
        }
    }
}

/// Prompt handed to `generate`: a single string or a batch.
///
/// Only batches of exactly one prompt are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Single(String),
    Batch(Vec<String>),
}

impl Prompt {
    pub fn into_single(self) -> Result<String, LlmError> {
        match self {
            Prompt::Single(prompt) => Ok(prompt),
            Prompt::Batch(mut prompts) => {
                if prompts.len() != 1 {
                    return Err(LlmError::InvalidInput(format!(
                        "Expected exactly one prompt, got {}",
                        prompts.len()
                    )));
                }
                Ok(prompts.remove(0))
            }
        }
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Prompt::Single(value.to_string())
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Prompt::Single(value)
    }
}

impl From<&String> for Prompt {
    fn from(value: &String) -> Self {
        Prompt::Single(value.clone())
    }
}

impl From<Vec<String>> for Prompt {
    fn from(value: Vec<String>) -> Self {
        Prompt::Batch(value)
    }
}

impl From<Vec<&str>> for Prompt {
    fn from(value: Vec<&str>) -> Self {
        Prompt::Batch(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Prompt {
    fn from(value: &[&str]) -> Self {
        Prompt::Batch(value.iter().map(|s| s.to_string()).collect())
    }
}
