/*!
 * Bounded exponential-backoff retry for fallible async operations.
 *
 * The policy is not specific to translation: any operation that can fail
 * transiently (rate limits, network blips) can be wrapped. The retry loop
 * inspects each attempt's result explicitly; it never distinguishes
 * transient from permanent errors by itself, so callers narrow the error
 * set before wrapping if they need finer-grained policy.
 */

use std::future::Future;
use std::time::Duration;

use log::{error, warn};

/// Retry policy with exponential backoff.
///
/// `max_retries` counts additional attempts after the first, so a policy
/// with `max_retries = 2` performs up to 3 attempts in total and
/// `max_retries = 0` performs exactly one attempt with no retry. The delay
/// before retry `n` is `initial_delay * backoff_factor^n`; it accumulates
/// multiplicatively within a single call and is never reset. No jitter is
/// added (a deliberate simplification, not a correctness requirement).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial one
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_factor,
        }
    }

    /// Run an operation under this policy, propagating the last error
    /// unchanged once all attempts are exhausted.
    ///
    /// Each retry emits a warning with the attempt number and the computed
    /// delay; this is observability only, not control flow.
    pub async fn run<T, E, F, Fut>(&self, op_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.initial_delay;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt == self.max_retries {
                        error!(
                            "All {} retries failed for {}: {}",
                            self.max_retries, op_name, e
                        );
                        return Err(e);
                    }

                    warn!(
                        "Attempt {}/{} failed for {}: {}. Retrying in {:.1}s...",
                        attempt + 1,
                        self.max_retries + 1,
                        op_name,
                        e,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(self.backoff_factor);
                }
            }
        }

        unreachable!("retry loop always returns from within");
    }
}
