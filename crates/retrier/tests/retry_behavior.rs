//! End-to-end behaviour of the retry executor through the public API.
//!
//! All timing tests run on a paused tokio clock, so elapsed virtual time is
//! exactly the sum of the backoff waits that were taken.

use retrier::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error, PartialEq)]
enum ServiceError {
    #[error("service unavailable (attempt {0})")]
    Unavailable(u32),
    #[error("invalid credentials")]
    Unauthorized,
}

fn fixed_retrier(max_attempts: u32, millis: u64) -> Retrier {
    Retrier::builder()
        .max_attempts(max_attempts)
        .backoff(FixedBackoff::new(Duration::from_millis(millis)))
        .build()
}

/// Counts backoff calls so tests can assert how many waits happened.
fn counting_backoff(waits: Arc<AtomicU32>, delay: Duration) -> impl Backoff {
    move |_attempt: u32| {
        waits.fetch_add(1, Ordering::SeqCst);
        delay
    }
}

#[tokio::test(start_paused = true)]
async fn succeeds_on_third_attempt_after_two_waits() {
    let waits = Arc::new(AtomicU32::new(0));
    let retrier = Retrier::builder()
        .max_attempts(3)
        .backoff(counting_backoff(Arc::clone(&waits), Duration::from_millis(100)))
        .build();
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let value = assert_ok!(
        retrier
            .execute(&Never, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(ServiceError::Unavailable(attempt))
                    } else {
                        Ok("payload")
                    }
                }
            })
            .await
    );

    assert_eq!(value, "payload");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(waits.load(Ordering::SeqCst), 2);
    assert_eq!(start.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn exhaustion_wraps_the_final_failure() {
    let calls = AtomicU32::new(0);

    let err = assert_err!(
        fixed_retrier(3, 10)
            .execute(&Never, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err::<(), _>(ServiceError::Unavailable(attempt)) }
            })
            .await
    );

    assert!(err.is_exhausted());
    assert!(!err.is_unretryable());
    assert!(!err.is_canceled());
    assert_eq!(err.attempts(), Some(3));
    assert_eq!(err.cause(), Some(&ServiceError::Unavailable(2)));
    assert_eq!(
        err.to_string(),
        "all attempts failed: service unavailable (attempt 2)"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn unretryable_error_stops_immediately() {
    let waits = Arc::new(AtomicU32::new(0));
    let retrier = Retrier::builder()
        .max_attempts(5)
        .backoff(counting_backoff(Arc::clone(&waits), Duration::from_secs(1)))
        .retry_if_error(|err: &ServiceError| !matches!(err, ServiceError::Unauthorized))
        .build();
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let err = assert_err!(
        retrier
            .execute(&Never, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ServiceError::Unauthorized) }
            })
            .await
    );

    assert!(err.is_unretryable());
    assert_eq!(
        std::error::Error::source(&err).map(ToString::to_string),
        Some("invalid credentials".to_string())
    );
    assert_eq!(err.into_cause(), Some(ServiceError::Unauthorized));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(waits.load(Ordering::SeqCst), 0);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn unbounded_retry_canceled_while_waiting() {
    let retrier = fixed_retrier(0, 60_000);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        canceller.cancel();
    });
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let err = assert_err!(
        retrier
            .execute(&token, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err::<(), _>(ServiceError::Unavailable(attempt)) }
            })
            .await
    );

    assert!(err.is_canceled());
    assert_eq!(err.cancellation(), Some(&Canceled));
    assert_eq!(err.to_string(), "operation canceled");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::from_millis(250));
}

#[tokio::test]
async fn already_canceled_signal_never_invokes_operation() {
    let ctx = Context::new();
    ctx.cancel();
    let calls = AtomicU32::new(0);

    let err = assert_err!(
        Retrier::default()
            .execute(&ctx, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ServiceError>(()) }
            })
            .await
    );

    assert!(matches!(err, RetryError::Canceled(ContextError::Canceled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_bounds_unbounded_retries() {
    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let err = assert_err!(
        fixed_retrier(0, 30)
            .execute(&ctx, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err::<(), _>(ServiceError::Unavailable(attempt)) }
            })
            .await
    );

    // Attempts at 0, 30, 60 and 90ms; the wait towards 120ms hits the deadline
    assert!(matches!(
        err,
        RetryError::Canceled(ContextError::DeadlineExceeded)
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(start.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_checked_before_next_attempt() {
    let ctx = Context::new().with_timeout(Duration::from_millis(50));
    let calls = AtomicU32::new(0);

    // The attempt itself outlives the deadline; no further attempt starts
    let err = assert_err!(
        fixed_retrier(0, 0)
            .execute(&ctx, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(80)).await;
                    Err::<(), _>(ServiceError::Unavailable(0))
                }
            })
            .await
    );

    assert!(matches!(
        err,
        RetryError::Canceled(ContextError::DeadlineExceeded)
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_does_not_preempt_in_flight_attempt() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    let start = Instant::now();

    // Canceled mid-attempt, but the attempt runs to completion and its success wins
    let value = assert_ok!(
        fixed_retrier(3, 10)
            .execute(&token, |_| {
                let canceller = canceller.clone();
                async move {
                    canceller.cancel();
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    Ok::<_, ServiceError>(7)
                }
            })
            .await
    );

    assert_eq!(value, 7);
    assert_eq!(start.elapsed(), Duration::from_millis(40));
}

#[tokio::test(start_paused = true)]
async fn failure_on_last_attempt_reports_exhaustion_despite_cancellation() {
    let token = CancellationToken::new();
    let canceller = token.clone();

    let err = assert_err!(
        fixed_retrier(1, 10)
            .execute(&token, |attempt| {
                let canceller = canceller.clone();
                async move {
                    canceller.cancel();
                    Err::<(), _>(ServiceError::Unavailable(attempt))
                }
            })
            .await
    );

    assert!(err.is_exhausted());
    assert!(!err.is_canceled());
    assert_eq!(err.attempts(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn predicate_runs_before_cancellation_is_observed() {
    let checks = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&checks);
    let retrier = Retrier::builder()
        .max_attempts(0)
        .backoff(FixedBackoff::new(Duration::from_millis(10)))
        .retry_if(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .build();
    let token = CancellationToken::new();
    let canceller = token.clone();
    let calls = AtomicU32::new(0);

    let err = assert_err!(
        retrier
            .execute(&token, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                let canceller = canceller.clone();
                async move {
                    canceller.cancel();
                    Err::<(), _>(ServiceError::Unavailable(attempt))
                }
            })
            .await
    );

    assert!(err.is_canceled());
    assert_eq!(checks.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn convenience_entry_point_applies_defaults() {
    let token = CancellationToken::new();
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let err = assert_err!(
        retrier::retry(&token, 2, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>(ServiceError::Unavailable(attempt)) }
        })
        .await
    );

    assert!(err.is_exhausted());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // One default linear wait: 1s with up to 10% jitter
    let waited = start.elapsed().as_secs_f64();
    assert!((0.899..=1.101).contains(&waited), "waited {waited}s");
}

#[tokio::test(start_paused = true)]
async fn fresh_runs_are_repeatable() {
    async fn run(retrier: &Retrier) -> (bool, u32, Duration) {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result = retrier
            .execute(&Never, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(ServiceError::Unavailable(attempt))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        let exhausted = result.is_err_and(|err| err.is_exhausted());
        (exhausted, calls.load(Ordering::SeqCst), start.elapsed())
    }

    let retrier = Retrier::builder()
        .max_attempts(3)
        .backoff(
            LinearBackoff::builder()
                .base(Duration::from_millis(10))
                .step(Duration::from_millis(10))
                .jitter(0.0)
                .build(),
        )
        .build();

    let first = run(&retrier).await;
    let second = run(&retrier).await;

    assert_eq!(first, (true, 3, Duration::from_millis(30)));
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn retrier_from_config() {
    let config: RetryConfig = toml::from_str(
        r#"
        max_attempts = 4

        [backoff]
        kind = "exponential"
        base_ms = 10
        factor = 2.0
        max_ms = 25
        jitter = 0.0
        "#,
    )
    .unwrap();
    let retrier = assert_ok!(config.into_retrier());
    let start = Instant::now();

    let err = assert_err!(
        retrier
            .execute(&Never, |attempt| async move {
                Err::<(), _>(ServiceError::Unavailable(attempt))
            })
            .await
    );

    assert_eq!(err.attempts(), Some(4));
    // 10ms + 20ms + 25ms (capped)
    assert_eq!(start.elapsed(), Duration::from_millis(55));
}

#[tokio::test(start_paused = true)]
async fn shared_retrier_across_tasks() {
    let retrier = fixed_retrier(5, 5);
    let ctx = Context::new();

    let handles: Vec<_> = (0..4u32)
        .map(|task| {
            let retrier = retrier.clone();
            let ctx = ctx.child();
            tokio::spawn(async move {
                retrier
                    .execute(&ctx, move |attempt| async move {
                        if attempt < task {
                            Err(ServiceError::Unavailable(attempt))
                        } else {
                            Ok(task)
                        }
                    })
                    .await
            })
        })
        .collect();

    for (task, handle) in handles.into_iter().enumerate() {
        let value = assert_ok!(handle.await.unwrap());
        assert_eq!(value as usize, task);
    }
}
