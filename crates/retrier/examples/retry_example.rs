//! Example: Driving operations through the retry executor
//!
//! This example demonstrates:
//! 1. Retrying a flaky call with exponential backoff
//! 2. A typed retry predicate that stops on permanent errors
//! 3. Unbounded retries bounded only by a context deadline
//! 4. Jitter impact on a fixed delay
//!
//! Run with:
//! ```bash
//! cargo run -p retrier --example retry_example
//! ```

use retrier::prelude::*;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("transient error on attempt {0}")]
    Transient(u32),
    #[error("auth failed")]
    Unauthorized,
}

/// A simulated API that fails the first few times
struct UnreliableApi {
    calls: AtomicU32,
    fail_count: u32,
}

impl UnreliableApi {
    fn new(fail_count: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn call(&self, attempt: u32) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED (simulating transient error)", attempt);
            Err(ApiError::Transient(attempt))
        } else {
            println!("  Attempt {}: SUCCESS", attempt);
            Ok("API response data".to_string())
        }
    }

    fn total_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Example 1: Simple retry with exponential backoff
async fn example_simple_retry() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Simple Retry with Exponential Backoff ===\n");

    let retrier = Retrier::builder()
        .max_attempts(4)
        .backoff(
            ExponentialBackoff::builder()
                .base(Duration::from_millis(100))
                .factor(2.0)
                .jitter(0.0) // No jitter for predictable output
                .build(),
        )
        .build();

    let api = UnreliableApi::new(2);

    println!("Calling unreliable API (will fail 2 times before succeeding)...");
    let start = Instant::now();

    let result = retrier
        .execute(&Never, |attempt| {
            let api = &api;
            async move { api.call(attempt).await }
        })
        .await?;

    println!("\nResult: {}", result);
    println!("Total calls: {}", api.total_calls());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 200ms = ~300ms");

    Ok(())
}

/// Example 2: Typed retry predicate
async fn example_custom_predicate() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Typed Retry Predicate ===\n");

    let retrier = Retrier::builder()
        .max_attempts(5)
        .backoff(FixedBackoff::new(Duration::from_millis(10)))
        .retry_if_error(|err: &ApiError| matches!(err, ApiError::Transient(_)))
        .build();

    println!("Auth error (should NOT retry)");
    let calls = AtomicU32::new(0);
    let result = retrier
        .execute(&Never, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ApiError::Unauthorized) }
        })
        .await;

    match result {
        Err(err @ RetryError::Unretryable(_)) => {
            println!("  Stopped after {} call: {}", calls.load(Ordering::SeqCst), err)
        }
        other => return Err(format!("unexpected outcome: {other:?}").into()),
    }

    println!("\nTransient errors until attempts run out");
    let result = retrier
        .execute(&Never, |attempt| async move {
            Err::<(), _>(ApiError::Transient(attempt))
        })
        .await;

    if let Err(err) = result {
        println!(
            "  Exhausted: {} (attempts: {})",
            err,
            err.attempts().unwrap_or_default()
        );
    }

    Ok(())
}

/// Example 3: Unbounded retries with a deadline
async fn example_deadline() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Unbounded Retries with a Deadline ===\n");

    let retrier = Retrier::builder()
        .max_attempts(0)
        .backoff(FixedBackoff::new(Duration::from_millis(40)))
        .build();
    let ctx = Context::new().with_timeout(Duration::from_millis(150));
    let start = Instant::now();

    let result = retrier
        .execute(&ctx, |attempt| async move {
            println!("  Attempt {}: still down", attempt);
            Err::<(), _>(ApiError::Transient(attempt))
        })
        .await;

    if let Err(RetryError::Canceled(reason)) = result {
        println!("  Gave up after {:?}: {}", start.elapsed(), reason);
    }

    Ok(())
}

/// Example 4: Jitter demonstration
async fn example_jitter_impact() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 4: Jitter Impact (10 samples) ===\n");

    let steady = FixedBackoff::new(Duration::from_millis(100));
    let jittered = FixedBackoff::new(Duration::from_millis(100)).with_jitter(0.3);

    println!("Without jitter:");
    for i in 0..10 {
        println!("  Sample {}: {:?}", i + 1, steady.next_delay(0));
    }

    println!("\nWith 30% jitter:");
    let samples: Vec<_> = (0..10).map(|_| jittered.next_delay(0)).collect();
    for (i, delay) in samples.iter().enumerate() {
        println!("  Sample {}: {:?}", i + 1, delay);
    }

    let avg = samples.iter().map(|d| d.as_millis() as f64).sum::<f64>() / samples.len() as f64;
    println!("\nAnalysis:");
    println!("  Jittered delays should vary within 70-130ms");
    println!("  Average with jitter: {:.1}ms", avg);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("==============================================");
    println!("   retrier: Retry Executor Examples");
    println!("==============================================");

    example_simple_retry().await?;
    example_custom_predicate().await?;
    example_deadline().await?;
    example_jitter_impact().await?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
