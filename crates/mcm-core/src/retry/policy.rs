use std::time::Duration;

use thiserror::Error;

use super::classify::RetryableMarkers;

/// Rejected policy parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("backoff multiplier must be a finite number greater than 1 (got {0})")]
    Multiplier(f64),
    #[error("max delay ({max:?}) is shorter than initial delay ({initial:?})")]
    DelayOrder { initial: Duration, max: Duration },
}

/// Exponential backoff policy with a cap and a transient-error classifier.
///
/// Values are fixed once built; per-call changes go through [`RetryOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor per attempt; must be > 1.
    pub backoff_multiplier: f64,
    pub retryable_markers: RetryableMarkers,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            retryable_markers: RetryableMarkers::default(),
        }
    }
}

/// Per-call overrides; `None` keeps the base policy's value.
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    pub max_retries: Option<u32>,
    pub initial_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub backoff_multiplier: Option<f64>,
    pub retryable_markers: Option<RetryableMarkers>,
}

impl RetryPolicy {
    /// Check the invariants the backoff computation relies on.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 1.0 {
            return Err(PolicyError::Multiplier(self.backoff_multiplier));
        }
        if self.max_delay < self.initial_delay {
            return Err(PolicyError::DelayOrder {
                initial: self.initial_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// A copy of this policy with `opts` applied, validated.
    pub fn with_overrides(&self, opts: &RetryOptions) -> Result<Self, PolicyError> {
        let policy = Self {
            max_retries: opts.max_retries.unwrap_or(self.max_retries),
            initial_delay: opts.initial_delay.unwrap_or(self.initial_delay),
            max_delay: opts.max_delay.unwrap_or(self.max_delay),
            backoff_multiplier: opts.backoff_multiplier.unwrap_or(self.backoff_multiplier),
            retryable_markers: opts
                .retryable_markers
                .clone()
                .unwrap_or_else(|| self.retryable_markers.clone()),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        delay(attempt, self)
    }
}

/// `min(initial_delay * backoff_multiplier^attempt, max_delay)`, no jitter.
///
/// Computed in floating point nanoseconds so huge attempts saturate to
/// infinity and clamp instead of overflowing.
pub fn delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = policy.initial_delay.as_nanos() as f64 * policy.backoff_multiplier.powi(exp);
    let cap = policy.max_delay.as_nanos() as f64;
    if !raw.is_finite() || raw >= cap {
        return policy.max_delay;
    }
    Duration::from_nanos(raw.round() as u64)
}
