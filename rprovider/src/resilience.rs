//! Retry policies, the generic retry executor, and sleep injection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rcommon::BoxFuture;

use crate::ProviderError;

/// Attempt budget and backoff schedule for one retry domain.
///
/// Two domains are tuned independently: the conversation orchestrator uses
/// [`RetryPolicy::fixed`] (5 attempts, constant wait) and the embedding
/// client uses [`RetryPolicy::exponential`] (4 attempts, doubling toward a
/// cap). Attempt budgets count total attempts, not retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: wait,
            max_backoff: wait,
            backoff_multiplier: 1.0,
        }
    }

    pub fn exponential(max_attempts: u32, initial: Duration, cap: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: initial,
            max_backoff: cap,
            backoff_multiplier: 2.0,
        }
    }

    /// Whether another attempt may follow `attempt` (1-based). Error class is
    /// not consulted: both retry domains retry every failure and leave error
    /// classification to the rotation decision.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }
}

/// Injectable sleep so tests never wait on wall-clock backoff.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Production sleeper backed by `futures_timer::Delay`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerSleeper;

impl Sleeper for TimerSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(futures_timer::Delay::new(duration))
    }
}

/// Sleeper that completes immediately; for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

/// Operational hooks reported by the retry executor and by the turn
/// orchestrator's own attempt loop.
pub trait RetryHooks: Send + Sync {
    fn on_attempt_start(&self, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _operation: &str, _attempts: u32) {}

    fn on_failure(&self, _operation: &str, _attempts: u32, _error: &ProviderError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRetryHooks;

impl RetryHooks for NoopRetryHooks {}

pub async fn execute_with_retry<T, Op, OpFuture>(
    operation: &str,
    policy: &RetryPolicy,
    hooks: &dyn RetryHooks,
    sleeper: &Arc<dyn Sleeper>,
    mut execute: Op,
) -> Result<T, ProviderError>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(operation, attempt);

        match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(operation, attempt);
                return Ok(value);
            }
            Err(error) => {
                if policy.should_retry(attempt) {
                    let delay = policy.backoff_for_attempt(attempt);
                    hooks.on_retry_scheduled(operation, attempt, delay, &error);
                    sleeper.sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                hooks.on_failure(operation, attempt, &error);
                return Err(error);
            }
        }
    }
}
