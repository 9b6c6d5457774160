//! Retry with exponential backoff for model-serving HTTP calls.
//!
//! Retries on 408, 429 and 5xx responses and on transport errors. Client
//! errors fail immediately. A `Retry-After` header (in seconds) overrides the
//! computed delay, capped at `max_delay`.

use anyhow::Result;
use reqwest::{header::RETRY_AFTER, Response, StatusCode};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Run `send` until it yields a successful response, a non-retryable
/// failure, or the policy runs out of attempts.
pub async fn with_retry<F, Fut>(policy: &RetryPolicy, label: &str, send: F) -> Result<Response>
where
    F: Fn() -> Fut,
    Fut: Future<Output = reqwest::Result<Response>>,
{
    let mut last_error = String::from("no attempts made");

    for attempt in 1..=policy.max_attempts {
        let mut delay = policy.delay_after(attempt);

        match send().await {
            Ok(response) if response.status().is_success() => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(response);
            }
            Ok(response) => {
                let status = response.status();
                if let Some(hint) = retry_after(&response) {
                    delay = hint.min(policy.max_delay);
                }
                let body = response.text().await.unwrap_or_default();
                if !is_retryable(status) {
                    anyhow::bail!("{} error {}: {}", label, status, body);
                }
                tracing::warn!(
                    "{} returned {} (attempt {}/{})",
                    label,
                    status,
                    attempt,
                    policy.max_attempts
                );
                last_error = format!("{} {}: {}", label, status, body);
            }
            Err(e) => {
                tracing::warn!(
                    "{} transport error (attempt {}/{}): {}",
                    label,
                    attempt,
                    policy.max_attempts,
                    e
                );
                last_error = format!("{}: {}", label, e);
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(delay).await;
        }
    }

    anyhow::bail!(
        "{} failed after {} attempts; last error: {}",
        label,
        policy.max_attempts,
        last_error
    )
}
