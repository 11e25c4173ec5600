use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AdvisorError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Bounded retry with linear backoff: attempt `n` is followed by a `base_delay * n` pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Runs `operation` until it succeeds or attempts run out.
    ///
    /// Fatal errors (see [`AdvisorError::is_fatal`]) are returned as-is on the spot.
    /// Every other failure is retried; after the last attempt a single
    /// [`AdvisorError::RetriesExhausted`] wraps the final cause.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, AdvisorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AdvisorError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if err.is_fatal() {
                return Err(err);
            }
            warn!(
                operation = operation_name,
                attempt,
                max_attempts = attempts,
                error = %err,
                "AI call failed"
            );
            if attempt >= attempts {
                return Err(AdvisorError::RetriesExhausted {
                    operation: operation_name.to_string(),
                    attempts,
                    source: Box::new(err),
                });
            }
            tokio::time::sleep(self.delay_after(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts_with_linear_delays() {
        let calls = &AtomicU32::new(0);
        let started = Instant::now();
        let result: Result<(), _> = RetryPolicy::default()
            .run("AI recipe generation", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(AdvisorError::EmptyResponse(format!("call {}", n)))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second, none after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3100), "{:?}", elapsed);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("call 3"), "{}", err);
        assert!(err.to_string().starts_with("AI recipe generation failed after 3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_second_attempt() {
        let calls = &AtomicU32::new(0);
        let started = Instant::now();
        let value = RetryPolicy::default()
            .run("op", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AdvisorError::EmptyResponse("op".into()))
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000) && elapsed < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let err = RetryPolicy::default()
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AdvisorError::MissingCredential("GEMINI_API_KEY".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, AdvisorError::MissingCredential(_)));
    }

    #[test]
    fn delays_grow_linearly() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(4), Duration::from_millis(1000));
    }
}
