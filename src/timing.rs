//! Cancellation-aware timing shared by the loop runners.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleep for `delay`, waking early if the token fires.
///
/// Returns true when the full delay elapsed and false when the sleep was cut
/// short by cancellation. A zero delay completes immediately.
pub(crate) async fn sleep_unless_cancelled(delay: Duration, shutdown: &CancellationToken) -> bool {
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.cancelled() => false,
    }
}
