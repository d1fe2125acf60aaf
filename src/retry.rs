//! Exponential-backoff retry around a single-attempt request.

use std::time::Duration;

use crate::config::{ApiConfig, Environment};
use crate::transport::Outcome;

/// Which failure classes a request may be retried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// Reads: network, timeout and 5xx failures are retried.
    Query,
    /// Writes: only network and timeout failures are retried. A 5xx may mean
    /// the write was applied, so replaying it could duplicate side effects.
    Mutation,
}

/// One scheduled retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// Zero-based index of the retry (0 is the first replay).
    pub attempt: u32,
    pub delay: Duration,
}

/// Bounded exponential backoff: `delay = base_delay * 2^attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` counts every attempt, including the
    /// first, and is clamped to at least 1.
    #[must_use]
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts: max_attempts.max(1),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 1)
    }

    /// The default policy for an environment: 2 attempts in development,
    /// 4 in production, 1 second base delay.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let max_attempts = match environment {
            Environment::Development => 2,
            Environment::Production => 4,
        };
        Self::new(Duration::from_secs(1), max_attempts)
    }

    /// The policy described by the API configuration.
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.retry_base_delay, config.retry_max_attempts)
    }

    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before retry number `attempt` (zero-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 1_u32 << attempt.min(20);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Returns `true` if `outcome` belongs to a retryable class for `mode`.
    #[must_use]
    pub const fn is_retryable(mode: RetryMode, outcome: &Outcome) -> bool {
        match outcome {
            Outcome::Ok { .. } => false,
            Outcome::NetworkError { .. } | Outcome::TimeoutError => true,
            Outcome::HttpError { status, .. } => {
                matches!(mode, RetryMode::Query) && *status >= 500
            }
        }
    }

    /// The delays this policy would wait between attempts, in order.
    pub fn schedule(&self) -> impl Iterator<Item = RetryAttempt> + '_ {
        (0..self.max_attempts - 1).map(|attempt| RetryAttempt {
            attempt,
            delay: self.delay_for_attempt(attempt),
        })
    }

    /// Runs `request_fn` until it succeeds, fails non-retryably, or the
    /// attempt budget is spent. The last outcome is returned unchanged.
    pub async fn execute<F, Fut>(&self, mode: RetryMode, mut request_fn: F) -> Outcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut outcome = request_fn().await;

        for RetryAttempt { attempt, delay } in self.schedule() {
            if !Self::is_retryable(mode, &outcome) {
                break;
            }
            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                status = ?outcome.status(),
                "retrying request after transient failure"
            );
            tokio::time::sleep(delay).await;
            outcome = request_fn().await;
        }

        outcome
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_environment(Environment::Production)
    }
}
