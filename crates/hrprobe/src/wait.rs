//! Bounded polling.
//!
//! Every locate, network wait and assertion in hrprobe goes through
//! [`retry`]: the probe runs immediately, then at a fixed interval until it
//! succeeds or the timeout elapses. Nothing blocks indefinitely.

use crate::result::{ProbeError, ProbeResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout for wait operations (20 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// What a [`retry`] reports once its timeout is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    /// Report [`ProbeError::Timeout`]
    Timeout,
    /// Report the last retryable error the probe produced
    LastError,
}

/// Run `probe` until it succeeds or `options.timeout_ms` elapses.
///
/// Errors whose kind is retryable (not found, ambiguous, mismatch) are
/// retried; any other error aborts at once. The probe always runs at least
/// once, even with a zero timeout.
pub async fn retry<T, F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    exhausted: Exhausted,
    mut probe: F,
) -> ProbeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let last = match probe().await {
            Ok(value) => {
                tracing::trace!(waited_for, attempts, "wait satisfied");
                return Ok(value);
            }
            Err(e) if e.kind().is_retryable() => e,
            Err(e) => return Err(e),
        };

        if start.elapsed() >= options.timeout() {
            tracing::debug!(waited_for, attempts, error = %last, "wait exhausted");
            return Err(match exhausted {
                Exhausted::LastError => last,
                Exhausted::Timeout => ProbeError::Timeout {
                    ms: options.timeout_ms,
                    waited_for: format!("{waited_for} ({last})"),
                },
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll a boolean condition until it holds.
pub async fn wait_until<F, Fut>(options: &WaitOptions, waited_for: &str, mut check: F) -> ProbeResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    retry(options, waited_for, Exhausted::Timeout, || {
        let fut = check();
        async move {
            if fut.await? {
                Ok(())
            } else {
                Err(ProbeError::not_found(waited_for.to_string()))
            }
        }
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::result::FailureKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(200).with_poll_interval(10)
    }

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval(), Duration::from_millis(50));
        }

        #[test]
        fn test_builder() {
            let opts = WaitOptions::new().with_timeout(5).with_poll_interval(1);
            assert_eq!(opts.timeout(), Duration::from_millis(5));
            assert_eq!(opts.poll_interval_ms, 1);
        }
    }

    mod retry_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_after_retries() {
            let calls = AtomicU32::new(0);
            let value = retry(&fast(), "third call", Exhausted::Timeout, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ProbeError::not_found("not yet"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
            assert_eq!(value, 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_reports_timeout() {
            let err = retry(&fast(), "never", Exhausted::Timeout, || async {
                Err::<(), _>(ProbeError::not_found("missing"))
            })
            .await
            .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Timeout);
            assert!(err.to_string().contains("never"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_reports_last_error() {
            let err = retry(&fast(), "never", Exhausted::LastError, || async {
                Err::<(), _>(ProbeError::mismatch("title", "a", "b"))
            })
            .await
            .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Mismatch);
        }

        #[tokio::test(start_paused = true)]
        async fn test_fatal_error_aborts_immediately() {
            let calls = AtomicU32::new(0);
            let err = retry(&fast(), "fatal", Exhausted::Timeout, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ProbeError::driver("gone")) }
            })
            .await
            .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Driver);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_still_probes_once() {
            let opts = WaitOptions::new().with_timeout(0);
            let value = retry(&opts, "once", Exhausted::Timeout, || async { Ok(7) })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_until() {
            let calls = AtomicU32::new(0);
            wait_until(&fast(), "flag", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 1) }
            })
            .await
            .unwrap();

            let err = wait_until(&fast(), "flag", || async { Ok(false) })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Timeout);
        }
    }
}
