//! Bounded fixed-backoff retry for broker and service calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retry policy: how many attempts, and how long to sleep between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping `policy.backoff`
/// between attempts. Only errors for which `is_transient` returns true are
/// retried; any other error is returned immediately.
pub async fn retry<T, E, F, Fut, P>(policy: RetryPolicy, is_transient: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempt < policy.max_attempts => {
                warn!(attempt, max = policy.max_attempts, error = %e, "Transient failure, retrying");
                tokio::time::sleep(policy.backoff).await;
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

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_first_try_without_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(fast_policy(3), |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(fast_policy(5), |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("timeout".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(fast_policy(3), |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("timeout".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(
            fast_policy(5),
            |e: &String| e == "timeout",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("rejected".to_string()) }
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), "rejected");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
