/*!
 * Tests for the exponential-backoff retry policy
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use doctran::RetryPolicy;

#[tokio::test]
async fn test_retryPolicy_run_withTwoFailuresThenSuccess_shouldSucceedOnThirdAttempt() {
    // Scaled-down version of the reference scenario: max_retries=2,
    // backoff_factor=2.0, failures on the first two attempts
    let initial_delay = Duration::from_millis(20);
    let policy = RetryPolicy::new(2, initial_delay, 2.0);
    let calls = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let calls_clone = Arc::clone(&calls);
    let result: Result<&str, String> = policy
        .run("flaky-op", move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let call_number = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call_number <= 2 {
                    Err(format!("transient failure {}", call_number))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Observed delays are initial_delay then 2 * initial_delay
    assert!(
        start.elapsed() >= initial_delay * 3,
        "expected at least {:?} of backoff, got {:?}",
        initial_delay * 3,
        start.elapsed()
    );
}

#[tokio::test]
async fn test_retryPolicy_run_withExhaustedRetries_shouldPropagateLastError() {
    let policy = RetryPolicy::new(2, Duration::from_millis(1), 2.0);
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = Arc::clone(&calls);
    let result: Result<(), String> = policy
        .run("doomed-op", move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                let call_number = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {}", call_number))
            }
        })
        .await;

    // The last error propagates unchanged; max_retries + 1 total attempts
    assert_eq!(result.unwrap_err(), "failure 3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retryPolicy_run_withZeroRetries_shouldMakeExactlyOneAttempt() {
    let policy = RetryPolicy::new(0, Duration::from_secs(30), 2.0);
    let calls = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let calls_clone = Arc::clone(&calls);
    let result: Result<(), String> = policy
        .run("single-shot", move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // No backoff sleep happens on the only attempt
    assert!(start.elapsed() < Duration::from_secs(5));
}
