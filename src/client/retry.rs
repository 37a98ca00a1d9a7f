//! Retry with exponential backoff for client queries.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use super::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Extra random delay, as a fraction of the backoff (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return backoff;
        }
        let extra = rand::rng().random_range(0.0..=jitter);
        backoff + backoff.mul_f64(extra)
    }

    /// Run `op` until it succeeds, fails with an error that is not worth
    /// retrying, or runs out of retries.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: 0.0,
        }
    }

    #[test]
    fn test_backoff_doubles_and_clamps() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            jitter: 0.5,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_default_allows_one_retry() {
        assert_eq!(RetryPolicy::default().max_retries, 1);
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let result = quick(2)
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ClientError::status(503, "busy"))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = quick(1)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::status(429, "slow down"))
            })
            .await;
        assert!(matches!(result, Err(ClientError::Status { status: 429, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = quick(3)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::status(400, "bad input"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
