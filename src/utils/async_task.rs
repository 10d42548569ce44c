use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::error;
use tracing::warn;

use crate::BackoffPolicy;
use crate::Error;
use crate::Result;
use crate::SystemError;

/// Runs `task` until it succeeds, returns a non-retryable error, or the
/// policy is exhausted.
///
/// Each attempt is bounded by `policy.timeout_ms`. Between attempts the delay
/// starts at `base_delay_ms` and doubles up to `max_delay_ms`. With
/// `max_retries == 0` the task is retried until it stops failing with a
/// retryable error. The last error is returned once retries run out.
pub(crate) async fn task_with_timeout_and_exponential_backoff<F, T, P, R>(
    task: F,
    policy: BackoffPolicy,
    is_retryable: R,
) -> Result<P>
where
    F: Fn() -> T,
    T: Future<Output = Result<P>>,
    R: Fn(&Error) -> bool,
{
    let timeout_duration = Duration::from_millis(policy.timeout_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let mut delay = Duration::from_millis(policy.base_delay_ms);
    let mut attempts = 0;

    loop {
        let last_error = match timeout(timeout_duration, task()).await {
            Ok(Ok(r)) => return Ok(r),
            Ok(Err(e)) => {
                if !is_retryable(&e) {
                    return Err(e);
                }
                e
            }
            Err(_) => {
                warn!("task timed out after {:?}", timeout_duration);
                SystemError::RetryTimeout(timeout_duration).into()
            }
        };

        attempts += 1;
        if policy.max_retries != 0 && attempts >= policy.max_retries {
            warn!("task failed after {} attempts: {}", attempts, last_error);
            return Err(last_error);
        }

        sleep(delay).await;
        delay = (delay * 2).min(max_delay);
    }
}

/// Spawns a named task and logs its error instead of dropping it.
pub(crate) fn spawn_task<F, Fut>(
    name: &str,
    task_fn: F,
) -> JoinHandle<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        if let Err(e) = task_fn().await {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
    })
}
