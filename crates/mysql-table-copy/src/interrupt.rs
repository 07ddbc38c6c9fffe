//! Double-signal interrupt handling.
//!
//! A first interrupt only warns; a second one within the grace window
//! cancels the run. The context is shared between the signal listener and
//! whatever races the copy against [`InterruptContext::cancelled`].

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default window in which a second signal aborts the copy.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(3);

/// What a received signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal (or one after the window lapsed): keep running.
    Warned,
    /// Second signal inside the window: the token is cancelled.
    Cancelled,
}

/// Cancellation token plus the time of the last interrupt.
#[derive(Debug)]
pub struct InterruptContext {
    token: CancellationToken,
    last_signal: Mutex<Option<Instant>>,
    window: Duration,
}

impl Default for InterruptContext {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_WINDOW)
    }
}

impl InterruptContext {
    pub fn new(window: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            last_signal: Mutex::new(None),
            window,
        }
    }

    /// Record a signal received at `now`.
    pub fn on_signal(&self, now: Instant) -> SignalAction {
        let mut last = match self.last_signal.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let within_window = last.is_some_and(|prev| now.saturating_duration_since(prev) <= self.window);
        if within_window {
            warn!("Second interrupt received, aborting copy");
            self.token.cancel();
            return SignalAction::Cancelled;
        }

        *last = Some(now);
        warn!(
            "Interrupt received, send again within {}s to abort",
            self.window.as_secs()
        );
        SignalAction::Warned
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a second signal has arrived inside the window.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_signal_only_warns() {
        let ctx = InterruptContext::default();
        assert_eq!(ctx.on_signal(Instant::now()), SignalAction::Warned);
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_second_signal_within_window_cancels() {
        let ctx = InterruptContext::default();
        let t0 = Instant::now();
        ctx.on_signal(t0);
        assert_eq!(
            ctx.on_signal(t0 + Duration::from_secs(2)),
            SignalAction::Cancelled
        );
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_signal_after_window_starts_over() {
        let ctx = InterruptContext::new(Duration::from_secs(5));
        let t0 = Instant::now();
        ctx.on_signal(t0);
        assert_eq!(
            ctx.on_signal(t0 + Duration::from_secs(6)),
            SignalAction::Warned
        );
        assert!(!ctx.is_cancelled());
        // The window restarts from the most recent signal
        assert_eq!(
            ctx.on_signal(t0 + Duration::from_secs(9)),
            SignalAction::Cancelled
        );
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let ctx = InterruptContext::default();
        let t0 = Instant::now();
        ctx.on_signal(t0);
        ctx.on_signal(t0);
        tokio::time::timeout(Duration::from_secs(1), ctx.cancelled())
            .await
            .unwrap();
    }
}
