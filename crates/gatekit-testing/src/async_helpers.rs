//! Deadlines for async tests.
//!
//! Live-server tests wrap their bodies in these so a hung socket fails the
//! test instead of stalling the suite.

use std::future::Future;
use std::time::Duration;

/// Deadline used by [`with_default_timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Await `future`, failing the test if it runs past `limit`.
///
/// # Panics
///
/// Panics if `future` is still pending after `limit`.
pub async fn with_timeout<F: Future>(limit: Duration, future: F) -> F::Output {
    match tokio::time::timeout(limit, future).await {
        Ok(output) => output,
        Err(_) => panic!("test did not finish within {limit:?}"),
    }
}

/// [`with_timeout`] with [`DEFAULT_TIMEOUT`].
pub async fn with_default_timeout<F: Future>(future: F) -> F::Output {
    with_timeout(DEFAULT_TIMEOUT, future).await
}

/// Assert that nothing comes out of `future` for `window`, then drop it.
///
/// Use with cancel-safe futures such as a socket's next message.
///
/// # Panics
///
/// Panics if `future` completes within `window`.
pub async fn assert_still_pending<F: Future>(window: Duration, future: F) {
    if tokio::time::timeout(window, future).await.is_ok() {
        panic!("expected nothing within {window:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_passes_output_through() {
        let output = with_timeout(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "done"
        })
        .await;
        assert_eq!(output, "done");
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "test did not finish within 10ms")]
    async fn test_with_timeout_panics_when_late() {
        with_timeout(
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_secs(10)),
        )
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_assert_still_pending() {
        assert_still_pending(
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_secs(10)),
        )
        .await;
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "expected nothing within")]
    async fn test_assert_still_pending_panics_on_output() {
        assert_still_pending(Duration::from_secs(1), async {}).await;
    }
}
