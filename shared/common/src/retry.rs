//! Bounded retry with exponential backoff and jitter, plus a three-state
//! circuit breaker. Both treat exactly one failure as transient: an RPC
//! status with code `Unavailable`.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::DomainError;

fn is_retriable(err: &DomainError) -> bool {
    matches!(err, DomainError::Status(status) if status.is_unavailable())
}

/// Run `op` up to `max_retries` times.
///
/// Non-retriable failures return immediately. Before retry `i` (0-based)
/// the loop sleeps `2^i * base_delay + uniform(0, base_delay)`. On
/// exhaustion the last error is wrapped with the attempt count. Dropping
/// the returned future cancels the in-flight attempt or sleep.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    if max_retries < 1 {
        return Err(DomainError::Validation(format!(
            "max_retries must be > 0, got {max_retries}"
        )));
    }

    let mut last_err = None;
    for attempt in 0..max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) {
                    return Err(err);
                }
                last_err = Some(err);
            }
        }

        if attempt < max_retries - 1 {
            let base_ms = base_delay.as_millis().max(1) as u64;
            let jitter = rand::thread_rng().gen_range(0..base_ms);
            let backoff = base_ms.saturating_mul(1u64 << attempt.min(32));
            tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
        }
    }

    let last = last_err.expect("at least one attempt ran");
    Err(DomainError::Internal(format!(
        "after {max_retries} attempts: {last}"
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Process-local breaker guarding one backend peer. The mutex is held only
/// across the state decision and the outcome recording, never across the
/// guarded call itself.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// Run `op` unless the circuit is open and the reset timeout has not
    /// elapsed. Only retriable failures count toward the threshold; any
    /// success closes the circuit and clears the counter.
    pub async fn execute<T, Fut>(&self, op: Fut) -> Result<T, DomainError>
    where
        Fut: Future<Output = Result<T, DomainError>>,
    {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == CircuitState::Open {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed > self.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                } else {
                    return Err(DomainError::CircuitOpen);
                }
            }
        }

        let result = op.await;

        let mut inner = self.inner.lock().unwrap();
        match &result {
            Err(err) if is_retriable(err) => {
                inner.failure_count += 1;
                inner.last_failure = Some(Instant::now());
                if inner.failure_count >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                }
            }
            Ok(_) => {
                inner.failure_count = 0;
                inner.state = CircuitState::Closed;
            }
            Err(_) => {}
        }

        result
    }
}

/// Retry wrapped in the breaker: a refusal from the open circuit is not
/// retriable, so the loop gives up immediately instead of hammering a peer
/// the breaker has already declared down.
pub async fn retry_with_circuit_breaker<T, F, Fut>(
    breaker: &CircuitBreaker,
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    retry_with_backoff(max_retries, base_delay, || breaker.execute(op())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tutorlink_rpc::Status;

    fn unavailable() -> DomainError {
        DomainError::Status(Status::unavailable("peer down"))
    }

    #[tokio::test]
    async fn zero_max_retries_is_a_validation_error_with_no_calls() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(0, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_on_first_attempt_calls_once() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(5, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_retriable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(5, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DomainError::NotFound("lesson".into())) }
        })
        .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unavailable_then_success_counts_attempts() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(6, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 5 {
                    Err(unavailable())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn exhaustion_wraps_the_last_error_with_the_attempt_count() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(DomainError::Internal(msg)) => assert!(msg.contains("after 3 attempts")),
            other => panic!("expected wrapped internal error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn breaker_opens_after_threshold_and_refuses_without_calling() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        for _ in 0..2 {
            let _ = breaker
                .execute(async { Err::<(), _>(unavailable()) })
                .await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let calls = AtomicU32::new(0);
        let result = breaker
            .execute(async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_retriable_failures_do_not_trip_the_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
        for _ in 0..5 {
            let _ = breaker
                .execute(async { Err::<(), _>(DomainError::NotFound("x".into())) })
                .await;
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn success_closes_the_breaker_and_resets_the_counter() {
        let breaker = CircuitBreaker::new(2, Duration::from_millis(10));
        for _ in 0..2 {
            let _ = breaker
                .execute(async { Err::<(), _>(unavailable()) })
                .await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        // After the reset timeout the next call probes half-open.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = breaker.execute(async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn open_breaker_stops_the_retry_loop_immediately() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
        let _ = breaker
            .execute(async { Err::<(), _>(unavailable()) })
            .await;
        assert_eq!(breaker.state(), CircuitState::Open);

        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry_with_circuit_breaker(&breaker, 5, Duration::from_millis(1), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        assert!(matches!(result, Err(DomainError::CircuitOpen)));
        // The refusal is non-retriable: no further probes, op never ran.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
