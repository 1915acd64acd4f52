//! Retry with exponential backoff and jitter.
//!
//! Only errors classified as [`ErrorClass::Retriable`](crate::ErrorClass) are
//! retried. Cancellation is checked before every attempt and while sleeping.

use crate::{ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first try.
    pub max_attempts: u32,
    /// Base delay for backoff in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter ratio as percentage (0..=100).
    pub jitter_ratio_pct: u32,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ratio_pct: 0,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_for(self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let capped = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        let jitter_pct = u64::from(self.jitter_ratio_pct.min(100));
        if jitter_pct == 0 || capped == 0 {
            return Duration::from_millis(capped);
        }

        // Spread within [capped - range, capped + range], clipped to the cap.
        let range = capped.saturating_mul(jitter_pct) / 100;
        let span = range.saturating_mul(2).saturating_add(1);
        let offset = jitter_seed(attempt) % span;
        let jittered = capped
            .saturating_sub(range)
            .saturating_add(offset)
            .min(self.max_delay_ms);
        Duration::from_millis(jittered)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            jitter_ratio_pct: 20,
        }
    }
}

/// Retry a fallible async operation with backoff + jitter.
pub async fn retry_async<T, F, Fut>(
    ctx: &RequestContext,
    policy: RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_async_with_observer(ctx, policy, operation, &mut op, |_, _| {}).await
}

/// Retry with a callback invoked before each retry with the failed attempt number.
pub async fn retry_async_with_observer<T, F, Fut, Obs>(
    ctx: &RequestContext,
    policy: RetryPolicy,
    operation: &'static str,
    op: &mut F,
    mut on_retry: Obs,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Obs: FnMut(u32, &ErrorEnvelope),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt = attempt.saturating_add(1);
        ctx.ensure_not_cancelled(operation)?;

        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        if !error.class.is_retriable() || attempt >= max_attempts {
            return Err(error);
        }

        on_retry(attempt, &error);
        tokio::select! {
            () = ctx.cancelled() => {
                return Err(ErrorEnvelope::cancelled("operation cancelled")
                    .with_metadata("operation", operation));
            }
            () = tokio::time::sleep(policy.delay_for(attempt)) => {}
        }
    }
}

fn jitter_seed(attempt: u32) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| u64::from(duration.subsec_nanos()));
    nanos ^ u64::from(attempt).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, ErrorKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_ratio_pct: 0,
    };

    #[tokio::test]
    async fn retries_retriable_errors_until_success() -> Result<()> {
        let ctx = RequestContext::new_request();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_async(&ctx, FAST, "search", || {
            let counter = Arc::clone(&counter);
            async move {
                let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
                if attempt < 3 {
                    Err(ErrorEnvelope::service(503, "unavailable"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await?;

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        Ok(())
    }

    #[tokio::test]
    async fn does_not_retry_non_retriable_errors() {
        let ctx = RequestContext::new_request();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<()> = retry_async(&ctx, FAST, "lab_detail", || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::Relaxed);
                Err(ErrorEnvelope::not_found("lab 999 not found"))
            }
        })
        .await;

        assert_eq!(result.err().map(|error| error.kind), Some(ErrorKind::NotFound));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn observer_sees_each_retry() {
        let ctx = RequestContext::new_request();
        let mut seen = Vec::new();
        let mut op = || async {
            Err::<(), _>(ErrorEnvelope::network_with_code(ErrorCode::timeout(), "slow"))
        };

        let result =
            retry_async_with_observer(&ctx, FAST, "search", &mut op, |attempt, _| {
                seen.push(attempt);
            })
            .await;

        assert!(result.is_err());
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn cancelled_context_stops_before_first_attempt() {
        let ctx = RequestContext::new_request();
        ctx.cancel();

        let result: Result<()> = retry_async(&ctx, FAST, "search", || async { Ok(()) }).await;

        assert_eq!(result.err().map(|error| error.kind), Some(ErrorKind::Cancelled));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            jitter_ratio_pct: 20,
        };
        for attempt in 1..10 {
            assert!(policy.delay_for(attempt) <= Duration::from_millis(2_000));
        }
        assert_eq!(
            RetryPolicy { jitter_ratio_pct: 0, ..policy }.delay_for(2),
            Duration::from_millis(400)
        );
    }
}
