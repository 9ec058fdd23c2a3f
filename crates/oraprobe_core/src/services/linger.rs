//! Post-run linger.
//!
//! Keeps the process alive for a fixed pause after the probe, whatever its
//! outcome. An interrupt (Ctrl-C) ends the pause early and is swallowed.

use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on a single pause; longer values are clamped to it.
const MAX_LINGER: Duration = Duration::from_secs(86_400 * 365);

/// How a linger ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LingerOutcome {
    /// The full pause elapsed.
    Elapsed,
    /// An interrupt signal ended the pause early.
    Interrupted,
}

/// Block the calling thread for `duration`, or until Ctrl-C.
///
/// Runs a current-thread runtime for the timer and signal handler. If the
/// runtime cannot be built, falls back to a plain thread sleep.
pub fn linger(duration: Duration) -> LingerOutcome {
    if duration.is_zero() {
        return LingerOutcome::Elapsed;
    }

    tracing::debug!(secs = duration.as_secs_f64(), "Lingering before exit");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().enable_io().build();
    let outcome = match runtime {
        Ok(rt) => rt.block_on(linger_async(duration)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build linger runtime, sleeping without signal handling");
            std::thread::sleep(duration.min(MAX_LINGER));
            LingerOutcome::Elapsed
        }
    };

    tracing::debug!(outcome = ?outcome, "Linger finished");
    outcome
}

/// Wait for `duration` or Ctrl-C, whichever comes first.
pub async fn linger_async(duration: Duration) -> LingerOutcome {
    let deadline = deadline_after(duration);

    tokio::select! {
        _ = tokio::time::sleep_until(deadline) => LingerOutcome::Elapsed,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => LingerOutcome::Interrupted,
            Err(e) => {
                // Without a signal handler the pause still has to run out.
                tracing::debug!(error = %e, "Ctrl-C handler unavailable");
                tokio::time::sleep_until(deadline).await;
                LingerOutcome::Elapsed
            }
        },
    }
}

/// Deadline `duration` from now, clamped so the addition cannot overflow.
fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration.min(MAX_LINGER)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_linger_returns_immediately() {
        let start = std::time::Instant::now();
        assert_eq!(linger(Duration::ZERO), LingerOutcome::Elapsed);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_linger_waits_at_least_duration() {
        let duration = Duration::from_millis(120);
        let start = std::time::Instant::now();
        assert_eq!(linger(duration), LingerOutcome::Elapsed);
        assert!(start.elapsed() >= duration);
    }

    #[tokio::test(start_paused = true)]
    async fn test_linger_async_full_default_pause() {
        let start = Instant::now();
        let outcome = linger_async(Duration::from_secs(50)).await;
        assert_eq!(outcome, LingerOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_secs(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_linger_async_huge_duration_does_not_overflow() {
        let start = Instant::now();
        let outcome = linger_async(Duration::from_secs(u64::MAX)).await;
        assert_eq!(outcome, LingerOutcome::Elapsed);
        assert!(start.elapsed() >= MAX_LINGER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_clamped() {
        let now = Instant::now();
        assert_eq!(deadline_after(Duration::MAX), now + MAX_LINGER);
        assert_eq!(deadline_after(Duration::from_secs(50)), now + Duration::from_secs(50));
    }
}
