//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a shared atomic flag, set by the SIGINT handler
//! (or by tests) and polled by the sequencing core at the start and end
//! of every sleep slice. Cancellation is never pre-emptive: the longest
//! delay before it takes effect is one poll slice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::ports::Clock;

/// Result of a cancel-aware wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// The token was cancelled before the duration elapsed.
    Cancelled,
}

/// Shared cooperative cancellation flag. Cheap to clone; all clones
/// observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; safe to call from a signal
    /// handler thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `dur` in slices of at most `slice`, checking the flag
    /// at the start and end of every slice.
    ///
    /// A zero `dur` still performs one flag check, so a cancellation that
    /// arrived during the previous phase is observed before the next
    /// ACTIVE transition.
    pub fn wait_for<C: Clock>(&self, clock: &C, dur: Duration, slice: Duration) -> WaitOutcome {
        if self.is_cancelled() {
            return WaitOutcome::Cancelled;
        }
        let deadline = clock.now() + dur;
        loop {
            let now = clock.now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            clock.sleep(slice.min(deadline - now));
            if self.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
        }
    }

    /// Sleep until the token is cancelled or `limit` elapses. `None`
    /// waits indefinitely (the HOLDING phase has no automatic timeout).
    pub fn wait_until_released<C: Clock>(
        &self,
        clock: &C,
        limit: Option<Duration>,
        slice: Duration,
    ) -> WaitOutcome {
        match limit {
            Some(dur) => self.wait_for(clock, dur, slice),
            None => {
                while !self.is_cancelled() {
                    clock.sleep(slice);
                }
                WaitOutcome::Cancelled
            }
        }
    }
}
