//! Retry with exponential backoff for calls to hosted model services.

use std::future::Future;
use std::time::Duration;

/// Retries an operation on errors matching a caller-supplied predicate,
/// doubling the delay after each failed attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Policy for model-access propagation delays: 3 attempts, waiting
    /// 1s then 2s between them.
    pub fn access_propagation() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// exhausts `max_attempts`. The final error is returned as-is.
    pub async fn run<T, E, F, Fut>(
        &self,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable(&e) && attempt < self.max_attempts => {
                    tracing::warn!(
                        "Attempt {attempt}/{}: transient failure, retrying in {:?}",
                        self.max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
