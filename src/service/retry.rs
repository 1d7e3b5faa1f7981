use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn once(call_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            call_timeout,
        }
    }

    /// Doubling backoff before the retry that follows `attempt`; saturates
    /// instead of overflowing on absurd configured bases.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .checked_mul(2_u32.pow(attempt.saturating_sub(1).min(6)))
            .unwrap_or(Duration::MAX)
    }
}

/// Runs `op` under a per-call timeout, retrying failures and timeouts up to
/// `policy.max_attempts` times with doubling backoff.
pub async fn with_retry<T, F, Fut>(label: &str, policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err = anyhow!("{label}: no attempt made");

    for attempt in 1..=attempts {
        match tokio::time::timeout(policy.call_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => last_err = e,
            Err(_) => {
                last_err = anyhow!("{label}: timed out after {}ms", policy.call_timeout.as_millis())
            }
        }

        if attempt < attempts {
            let backoff = policy.backoff_for(attempt);
            tracing::warn!(label, attempt, backoff_ms = backoff.as_millis() as u64, error = %last_err, "retrying");
            tokio::time::sleep(backoff).await;
        }
    }

    Err(last_err)
}
