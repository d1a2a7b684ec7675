//! Pacing and linear-backoff retry loop used by `generate`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::LlmError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;
pub const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 20;

/// Source of real-time delays.
///
/// The client sleeps before every attempt (pacing) and after every failed
/// attempt (backoff). Swapping the sleeper lets callers observe or skip those
/// delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry ceiling and pacing applied to each generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts before giving up (default: 64)
    pub max_attempts: u32,
    /// Requests per minute; `None` disables pacing (default: 20)
    pub rate_limit_per_min: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limit_per_min: Some(DEFAULT_RATE_LIMIT_PER_MIN),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, rate_limit_per_min: Option<u32>) -> Self {
        Self {
            max_attempts,
            rate_limit_per_min,
        }
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.max_attempts == 0 {
            return Err(LlmError::InvalidInput(
                "retry ceiling must allow at least one attempt".to_string(),
            ));
        }
        if self.rate_limit_per_min == Some(0) {
            return Err(LlmError::InvalidInput(
                "rate_limit_per_min must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before each attempt: `60 / rate_limit_per_min` seconds.
    pub fn pacing_delay(&self) -> Option<Duration> {
        self.rate_limit_per_min
            .filter(|rate| *rate > 0)
            .map(|rate| Duration::from_secs_f64(60.0 / f64::from(rate)))
    }

    /// Delay after failed attempt `attempt` (1-based): `attempt` seconds.
    pub fn backoff(attempt: u32) -> Duration {
        Duration::from_secs(u64::from(attempt))
    }
}

/// Runs an operation under a [`RetryConfig`].
pub struct RetryPolicy<'a> {
    config: &'a RetryConfig,
    sleeper: &'a dyn Sleeper,
}

impl<'a> RetryPolicy<'a> {
    pub fn new(config: &'a RetryConfig, sleeper: &'a dyn Sleeper) -> Self {
        Self { config, sleeper }
    }

    /// Call `op` until it succeeds, fails with a non-retryable error, or the
    /// ceiling is reached.
    ///
    /// `op` receives the 1-based attempt index. There is no backoff after the
    /// final attempt.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        self.config.validate()?;

        let pacing = self.config.pacing_delay();
        let max_attempts = self.config.max_attempts;
        let mut last_error: Option<LlmError> = None;

        for attempt in 1..=max_attempts {
            if let Some(delay) = pacing {
                self.sleeper.sleep(delay).await;
            }

            match op(attempt).await {
                Ok(value) => {
                    debug!(attempt, "Attempt succeeded");
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt == max_attempts {
                        warn!(attempt, error = %e, "Final attempt failed");
                        last_error = Some(e);
                        break;
                    }

                    let backoff = RetryConfig::backoff(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        backoff_secs = backoff.as_secs(),
                        "Attempt failed, backing off"
                    );
                    last_error = Some(e);
                    self.sleeper.sleep(backoff).await;
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: max_attempts,
            source: Box::new(last_error.unwrap_or(LlmError::EmptyResponse)),
        })
    }
}
