//! Retry loop: run an async operation until success or the policy says stop.

use std::fmt::Display;
use std::future::Future;

use super::classify::{is_retryable, Classify};
use super::policy::RetryPolicy;

/// Runs `operation` until it succeeds, fails permanently, or `max_retries` is used up.
///
/// Attempts are strictly sequential. Between attempts the task sleeps for
/// `policy.delay(attempt)` on the tokio timer, so other tasks keep running.
/// The last error is returned unchanged. There is no timeout or cancellation
/// here; wrap the call in `tokio::time::timeout` or drop the future instead.
pub async fn execute<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_retryable(Some(&e), &policy.retryable_markers) {
                    tracing::debug!(attempt, "permanent failure, not retrying: {}", e);
                    return Err(e);
                }
                if attempt >= policy.max_retries {
                    tracing::warn!(
                        attempts = attempt + 1,
                        "retries exhausted: {}",
                        e
                    );
                    return Err(e);
                }
                let delay = policy.delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{RemoteError, RetryableMarkers};
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn success_first_try_makes_one_call() {
        let calls = AtomicU32::new(0);
        let out: Result<u32, RemoteError> = execute(&fast_policy(3), || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Ok(7) }
        })
        .await;
        assert_eq!(out, Ok(7));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn always_transient_makes_max_retries_plus_one_attempts() {
        let calls = AtomicU32::new(0);
        let out: Result<(), RemoteError> = execute(&fast_policy(3), || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(RemoteError::new("network error")) }
        })
        .await;
        assert_eq!(out, Err(RemoteError::new("network error")));
        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let calls = AtomicU32::new(0);
        let out: Result<u32, RemoteError> = execute(&fast_policy(5), || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                if n < 2 {
                    Err(RemoteError::with_code("reset", "ECONNRESET"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(out, Ok(2));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn permanent_error_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let out: Result<(), RemoteError> = execute(&fast_policy(10), || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(RemoteError::with_code("violates unique constraint", "2067")) }
        })
        .await;
        assert!(out.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let _: Result<(), RemoteError> = execute(&fast_policy(0), || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(RemoteError::new("timeout")) }
        })
        .await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn empty_markers_fail_fast() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            retryable_markers: RetryableMarkers::none(),
            ..fast_policy(3)
        };
        let _: Result<(), RemoteError> = execute(&policy, || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(RemoteError::new("ETIMEDOUT")) }
        })
        .await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn etimedout_sleeps_follow_backoff_then_propagate() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let stamps = RefCell::new(Vec::new());
        let out: Result<(), RemoteError> = execute(&policy, || {
            stamps.borrow_mut().push(start.elapsed());
            let n = stamps.borrow().len();
            async move {
                if n <= 4 {
                    Err(RemoteError::new("ETIMEDOUT"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(out, Err(RemoteError::new("ETIMEDOUT")));
        let stamps = stamps.into_inner();
        assert_eq!(stamps.len(), 4);
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        let expected = [1000u64, 2000, 4000];
        assert_eq!(gaps.len(), expected.len());
        for (gap, ms) in gaps.iter().zip(expected) {
            // paused clock advances to the timer tick, which is ms-granular
            assert!(*gap >= Duration::from_millis(ms), "gap {gap:?} < {ms}ms");
            assert!(*gap < Duration::from_millis(ms + 5), "gap {gap:?} > {ms}ms");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_does_not_block_other_tasks() {
        let policy = RetryPolicy::default();
        let ticker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Instant::now()
        });
        let start = Instant::now();
        let _: Result<(), RemoteError> =
            execute(&policy, || async { Err(RemoteError::new("timeout")) }).await;
        let ticked = ticker.await.unwrap();
        assert!(ticked - start < Duration::from_millis(1000));
    }
}
