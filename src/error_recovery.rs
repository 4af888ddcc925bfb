// src/error_recovery.rs
//! Bounded re-prompting with exponential backoff.
//!
//! The core contract is fail-fast. Re-prompting is an opt-in policy the
//! orchestrator layers on top, and only for failures where asking again can
//! plausibly help (see [`RetryPolicy::reprompt_classification`]).

use crate::error::PipelineFailure;
use std::time::Duration;

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn fail_fast() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Only a malformed reply is worth a second prompt; a dead backend is not.
    pub fn reprompt_classification(failure: &PipelineFailure) -> bool {
        matches!(failure, PipelineFailure::MalformedClassification { .. })
    }
}

/// Retries an async operation while `should_retry` accepts the failure.
pub async fn retry_with_backoff<F, T, Fut, P>(
    mut operation: F,
    policy: RetryPolicy,
    should_retry: P,
) -> Result<T, PipelineFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, PipelineFailure>>,
    P: Fn(&PipelineFailure) -> bool,
{
    let attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < attempts && should_retry(&e) => {
                log::warn!(
                    "Attempt {}/{} failed ({}), retrying after {:?}",
                    attempt,
                    attempts,
                    e.kind(),
                    delay
                );
                tokio::time::sleep(delay).await;

                delay = std::cmp::min(delay * 2, policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn malformed() -> PipelineFailure {
        PipelineFailure::MalformedClassification {
            reason: "not JSON".to_string(),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(malformed())
                    } else {
                        Ok(attempt)
                    }
                }
            },
            quick(5),
            RetryPolicy::reprompt_classification,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_with_backoff(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(malformed()) }
            },
            quick(2),
            RetryPolicy::reprompt_classification,
        )
        .await;

        assert_eq!(result, Err(malformed()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn backend_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let unreachable = PipelineFailure::BackendUnreachable {
            reason: "connection refused".to_string(),
        };

        let result: Result<(), _> = retry_with_backoff(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                let err = unreachable.clone();
                async move { Err(err) }
            },
            quick(5),
            RetryPolicy::reprompt_classification,
        )
        .await;

        assert_eq!(result, Err(unreachable));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fail_fast_makes_one_attempt() {
        let calls = AtomicU32::new(0);

        let _: Result<(), _> = retry_with_backoff(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(malformed()) }
            },
            RetryPolicy::fail_fast(),
            RetryPolicy::reprompt_classification,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
