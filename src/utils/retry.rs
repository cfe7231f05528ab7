// Retry logic with exponential backoff
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, warn};

/// Create exponential backoff configuration for retries
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(200),     // Start at 200ms
        initial_interval: Duration::from_millis(200),
        randomization_factor: 0.3,                         // Add jitter
        multiplier: 2.0,                                  // Double each time
        max_interval: Duration::from_secs(5),             // Cap at 5s
        max_elapsed_time: Some(Duration::from_secs(30)),  // Give up after 30s
        ..Default::default()
    }
}

/// Execute operation, retrying failures with exponential backoff.
/// - Gives up after `max_attempts` attempts (at least one is always made)
/// - Gives up early when the backoff schedule is exhausted
pub async fn with_retry<F, Fut, T, E>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let mut backoff = create_backoff();
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= max_attempts {
                    warn!("{} failed after {} attempts: {}", operation_name, attempt, e);
                    return Err(e);
                }

                let Some(delay) = backoff.next_backoff() else {
                    warn!("{} gave up after {} attempts: {}", operation_name, attempt, e);
                    return Err(e);
                };

                warn!(
                    "{} failed (attempt {}): {}, retrying after {}ms",
                    operation_name,
                    attempt,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
