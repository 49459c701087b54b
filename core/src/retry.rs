//! Bounded exponential backoff for remote calls.
//!
//! Attempts are strictly sequential: attempt n+1 never starts before
//! attempt n's failure is classified and the delay has elapsed. Attempt
//! count is deterministic given the policy; wall time is not (jitter).

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::classify::Classify;
use crate::error::IndexError;

/// Uniform jitter added to every backoff delay, in milliseconds.
const JITTER_MS: u64 = 200;

/// Called with (attempt number, classified failure) before each backoff
/// sleep. Not called for the final failure; that one is returned.
pub type RetryObserver = Box<dyn Fn(u32, &IndexError) + Send + Sync>;

pub struct RetryPolicy {
    /// Total attempts, including the first. Never exceeded.
    pub max_attempts: u32,
    /// Per-retry base delays. Shorter than `max_attempts - 1` is fine; the
    /// last entry is reused for later attempts.
    pub delays_ms: Vec<u64>,
    pub on_retry: Option<RetryObserver>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays_ms: vec![500, 1000, 2000],
            on_retry: None,
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delays_ms", &self.delays_ms)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryPolicy {
    pub fn with_observer(
        mut self,
        observer: impl Fn(u32, &IndexError) + Send + Sync + 'static,
    ) -> Self {
        self.on_retry = Some(Box::new(observer));
        self
    }

    /// Base delay for the given 1-based attempt, clamped to the schedule,
    /// plus jitter drawn uniformly from `[0, JITTER_MS)`.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let index =
            (attempt.saturating_sub(1) as usize).min(self.delays_ms.len().saturating_sub(1));
        let base = self.delays_ms.get(index).copied().unwrap_or(0);
        Duration::from_millis(base + rand::rng().random_range(0..JITTER_MS))
    }
}

/// Run `operation` under the policy, classifying every failure.
///
/// Success returns immediately. A non-retryable classification, or the
/// final attempt's failure, is returned without delay. Otherwise the
/// observer fires and the task sleeps before the next attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, IndexError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    let mut attempt: u32 = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let classified = err.classify();
                if attempt >= policy.max_attempts || !classified.retryable {
                    return Err(classified);
                }
                let delay = policy.delay_for_attempt(attempt);
                if let Some(observer) = &policy.on_retry {
                    observer(attempt, &classified);
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Default policy with a warn log per retry. Every remote call in the
/// operations layer goes through this.
pub async fn retry_remote<T, E, F, Fut>(op: &'static str, operation: F) -> Result<T, IndexError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    let policy = RetryPolicy::default().with_observer(move |attempt, err: &IndexError| {
        tracing::warn!(
            op,
            attempt,
            kind = err.kind.as_str(),
            "remote call failed, retrying: {}",
            err.message
        );
    });
    retry_with_backoff(operation, &policy).await
}
