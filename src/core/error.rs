use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LlmError {
    /// The caller handed in something the client cannot send.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A required setting (usually the endpoint URL) could not be resolved.
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Server returned no choices")]
    EmptyResponse,

    #[error("Failed to generate output after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// Whether another attempt against the server could plausibly succeed.
    ///
    /// Transport failures, rate limits, server errors and malformed or empty
    /// bodies are retryable. Client errors (auth, validation) and everything
    /// raised locally are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network { .. } | LlmError::Parse { .. } | LlmError::EmptyResponse => true,
            LlmError::Api { status_code, .. } => match status_code {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            LlmError::InvalidInput(_)
            | LlmError::Unsupported(_)
            | LlmError::MissingConfiguration(_)
            | LlmError::ProviderConfiguration(_)
            | LlmError::RetriesExhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::Api {
            message: "boom".to_string(),
            status_code: Some(status),
        }
    }

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        assert!(api(429).is_retryable());
        assert!(api(500).is_retryable());
        assert!(api(503).is_retryable());
        assert!(LlmError::EmptyResponse.is_retryable());
    }

    #[test]
    fn transport_and_decode_failures_are_retryable() {
        let network = LlmError::Network {
            message: "connection refused".to_string(),
            source: "refused".into(),
        };
        let parse = LlmError::Parse {
            message: "Failed to parse API response".to_string(),
            source: Box::new(serde_json::from_str::<serde_json::Value>("not json").unwrap_err()),
        };
        assert!(network.is_retryable());
        assert!(parse.is_retryable());
    }

    #[test]
    fn client_errors_fail_fast() {
        assert!(!api(401).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!LlmError::InvalidInput("two prompts".to_string()).is_retryable());
        assert!(!LlmError::Unsupported("logits".to_string()).is_retryable());
    }

    #[test]
    fn exhaustion_keeps_the_last_failure_as_source() {
        let err = LlmError::RetriesExhausted {
            attempts: 3,
            source: Box::new(api(502)),
        };
        assert_eq!(err.to_string(), "Failed to generate output after 3 attempts");
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "API error: boom");
    }
}
