use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::ConnectError;

/// Polls `condition` every `interval` until it holds.
///
/// Fails with `Cancelled` as soon as `cancelled` reports true and with
/// `Timeout` once `timeout` has elapsed.
pub async fn wait_for<F, C>(
    mut condition: F,
    cancelled: C,
    interval: Duration,
    timeout: Duration,
) -> Result<(), ConnectError>
where
    F: FnMut() -> bool,
    C: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if cancelled() {
            return Err(ConnectError::Cancelled);
        }
        if condition() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ConnectError::Timeout(timeout));
        }
        sleep(interval).await;
    }
}
