//! Bounded exponential-backoff retry for fallible async operations.
//!
//! Attempts run strictly one after another. Between attempt `k` and `k + 1`
//! the retrier sleeps `2^k * base + jitter`, with jitter drawn uniformly from
//! `[0, max_jitter)`. The first success is returned immediately; when every
//! attempt fails the last error is returned inside [`RetryError::Exhausted`].

use crate::error::RetryError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Wait schedule between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_jitter_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(1000, 1000)
    }
}

impl Backoff {
    pub const fn new(base_ms: u64, max_jitter_ms: u64) -> Self {
        Self {
            base_ms,
            max_jitter_ms,
        }
    }

    /// Delay to wait after the `attempt`-th failure (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(exponential.saturating_add(jitter))
    }
}

/// Retry `operation` up to `max_attempts` times with the default schedule
pub async fn retry<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    label: &str,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with(&Backoff::default(), operation, max_attempts, label).await
}

/// Retry `operation` up to `max_attempts` times using `backoff` between attempts
pub async fn retry_with<T, E, F, Fut>(
    backoff: &Backoff,
    mut operation: F,
    max_attempts: u32,
    label: &str,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            ::log::error!("{} failed after {} attempts: {}", label, attempt, error);
            return Err(RetryError::Exhausted {
                label: label.to_string(),
                attempts: attempt,
                last: error,
            });
        }

        let delay = backoff.delay(attempt);
        ::log::warn!(
            "{} attempt {} failed ({}). Retrying in {:.1} seconds...",
            label,
            attempt,
            error,
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Flaky(u32);

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "flaky failure #{}", self.0)
        }
    }

    impl std::error::Error for Flaky {}

    #[test]
    fn test_delay_doubles_per_attempt() {
        let backoff = Backoff::new(1000, 0);
        assert_eq!(backoff.delay(1).as_millis(), 2000);
        assert_eq!(backoff.delay(2).as_millis(), 4000);
        assert_eq!(backoff.delay(3).as_millis(), 8000);
    }

    #[test]
    fn test_jitter_stays_below_bound() {
        let backoff = Backoff::default();
        for _ in 0..200 {
            let ms = backoff.delay(1).as_millis();
            assert!((2000..3000).contains(&ms), "delay {} out of range", ms);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_returns_without_waiting() {
        let calls = Cell::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<u32, RetryError<Flaky>> = retry(
            || {
                calls.set(calls.get() + 1);
                async { Ok(7) }
            },
            3,
            "op",
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = Cell::new(0);

        let result = retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 3 { Err(Flaky(n)) } else { Ok(n) } }
            },
            3,
            "op",
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_error() {
        let calls = Cell::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Err(Flaky(n)) }
            },
            3,
            "Page navigation",
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.get(), 3);
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.last(), &Flaky(3));

        // 2s + 4s of backoff plus up to 1s jitter each; no wait after the last attempt
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(6000));
        assert!(waited < Duration::from_millis(8000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry(
            || {
                calls.set(calls.get() + 1);
                async { Err(Flaky(0)) }
            },
            0,
            "op",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
