//! Shared HTTP transport for the completion and scoring endpoints.

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::error::LlmError;

/// Configuration for the underlying HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total time allowed for a single request
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
        }
    }
}

/// Thin wrapper over `reqwest::Client` that turns every failure into an `LlmError`.
///
/// A call makes exactly one attempt; retrying is the caller's business
/// (see [`super::retry::RetryPolicy`]).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &HttpClientConfig, user_agent: Option<&str>) -> Result<Self, LlmError> {
        let default_ua = format!("sglang-lm/{}", env!("CARGO_PKG_VERSION"));
        let ua = user_agent.unwrap_or(&default_ua);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(ua)
            .build()
            .map_err(|e| {
                LlmError::ProviderConfiguration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// POST a JSON body and decode the JSON reply.
    ///
    /// Non-success statuses become [`LlmError::Api`] carrying the status code,
    /// so the caller can decide whether the failure is worth another attempt.
    #[tracing::instrument(
        name = "http_post_json",
        level = "debug",
        skip(self, headers, body),
        fields(url = %url),
        err
    )]
    pub async fn post_json<Req, Res>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<Res, LlmError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let mut req_builder = self.client.post(url).json(body);
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }

        let res = req_builder.send().await.map_err(|e| LlmError::Network {
            message: format!("Request to {url} failed"),
            source: Box::new(e),
        })?;

        let status = res.status();
        let response_text = res.text().await.map_err(|e| LlmError::Network {
            message: "Failed to read response body".to_string(),
            source: Box::new(e),
        })?;

        if !status.is_success() {
            warn!(status = %status, "API returned error status");
            return Err(LlmError::Api {
                message: format!("{status}: {response_text}"),
                status_code: Some(status.as_u16()),
            });
        }

        debug!(status = %status, bytes = response_text.len(), "HTTP request successful");

        serde_json::from_str(&response_text).map_err(|e| LlmError::Parse {
            message: "Failed to parse API response".to_string(),
            source: Box::new(e),
        })
    }
}
