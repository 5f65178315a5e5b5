//! Bounded retry with exponential backoff for weather requests.
//!
//! Retries:
//! - Timeouts and connection failures
//! - 5xx server errors, 429 and 408
//!
//! Never retries other 4xx responses (bad city, bad API key).

use std::future::Future;
use std::time::Duration;

use cafe_core::WeatherConfig;
use rand::Rng;
use reqwest::{Response, StatusCode};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries, before jitter
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&WeatherConfig::default())
    }
}

impl From<&WeatherConfig> for RetryConfig {
    fn from(config: &WeatherConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_retry_delay_ms,
            config.max_retry_delay_ms,
        )
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Single attempt, no retries.
    pub fn disabled() -> Self {
        Self::new(0, 0, 0)
    }

    /// Backoff for a given attempt: initial_delay * 2^attempt, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }

    /// Backoff plus up to 50% random jitter.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        let spread = base.as_millis() as u64 / 2;
        if spread == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=spread))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

/// Check if a reqwest error is retryable
pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    // Timeouts, refused connections and resets while sending
    if error.is_timeout() || error.is_connect() || error.is_request() {
        return RetryDecision::Retry;
    }

    if let Some(status) = error.status() {
        return is_retryable_status(status);
    }

    RetryDecision::NoRetry
}

/// Check if a status code is retryable
pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        return RetryDecision::Retry;
    }

    RetryDecision::NoRetry
}

/// Execute an HTTP request with retry logic.
///
/// Returns the first non-retryable response, the last response once retries
/// are exhausted, or the last transport error.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        let outcome = operation().await;
        let exhausted = attempt >= config.max_retries;

        match outcome {
            Ok(response) => {
                let status = response.status();
                if exhausted || is_retryable_status(status) == RetryDecision::NoRetry {
                    if attempt > 0 {
                        tracing::info!("Weather request finished after {} retries ({})", attempt, status);
                    }
                    return Ok(response);
                }
                tracing::warn!(
                    "Weather request returned retryable status {}, attempt {} of {}",
                    status,
                    attempt + 1,
                    config.max_retries + 1
                );
            }
            Err(e) => {
                if exhausted || is_retryable_error(&e) == RetryDecision::NoRetry {
                    if exhausted && attempt > 0 {
                        tracing::error!("All {} weather attempts failed", attempt + 1);
                    }
                    return Err(e);
                }
                tracing::warn!(
                    "Retryable error on attempt {} of {}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
            }
        }

        let delay = config.jittered_delay(attempt);
        tracing::debug!("Waiting {:?} before retry", delay);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
