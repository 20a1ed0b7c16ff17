// Retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Runs `operation` up to `1 + max_retries` times, sleeping with exponential
/// backoff between attempts. The last error is returned when all attempts fail.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, max_retries: u32) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempt >= max_retries {
                    return Err(error);
                }
                attempt += 1;

                let delay = Duration::from_millis(250 * 2u64.pow(attempt.min(5)));
                warn!(attempt, error = %error, "Retrying after failure");
                sleep(delay).await;
            }
        }
    }
}
