//! Boot guard -- startup delay covering the IPI diagnostic window.
//!
//! Immediately after power the IPI runs periodic diagnostic pulses; a
//! relay closure during that window is misread as a fault. The guard
//! blocks the first ACTIVE transition of a process lifetime until a
//! minimum time has elapsed since arming. Once satisfied it never
//! re-triggers within the process.

use std::time::Duration;

use log::info;

use crate::cancel::{CancelToken, WaitOutcome};
use crate::error::{Error, Result};
use crate::ports::Clock;

/// Process-lifetime gate on the first ACTIVE transition.
#[derive(Debug)]
pub struct BootGuard {
    /// Clock reading at arming.
    armed_at: Duration,
    /// Time elapsed before arming (system uptime), counted toward the
    /// threshold. Kept separate from `armed_at`: the process clock starts
    /// near zero, so subtracting a large uptime from it would saturate
    /// and lose the credit.
    credit: Duration,
    satisfied: bool,
}

impl BootGuard {
    /// Arm the guard now. Captured exactly once, at controller startup.
    pub fn new<C: Clock>(clock: &C) -> Self {
        Self {
            armed_at: clock.now(),
            credit: Duration::ZERO,
            satisfied: false,
        }
    }

    /// Arm the guard, crediting `already_elapsed` (typically the system
    /// uptime) -- the diagnostic window follows power-on, not process
    /// start, so time spent booting counts toward the threshold.
    pub fn with_elapsed<C: Clock>(clock: &C, already_elapsed: Duration) -> Self {
        Self {
            armed_at: clock.now(),
            credit: already_elapsed,
            satisfied: false,
        }
    }

    /// Block until `threshold` has elapsed since arming (plus any credit).
    ///
    /// The wait is cooperative and cancel-aware; cancellation aborts the
    /// command before any relay has gone ACTIVE, so no shutdown sequence
    /// is needed here. A zero threshold skips the wait without satisfying
    /// the guard: a later command with a real threshold still waits.
    pub fn ensure_safe<C: Clock>(
        &mut self,
        threshold: Duration,
        clock: &C,
        cancel: &CancelToken,
        slice: Duration,
    ) -> Result<()> {
        if self.satisfied || threshold.is_zero() {
            return Ok(());
        }
        let elapsed = clock.now().saturating_sub(self.armed_at) + self.credit;
        if let Some(remaining) = threshold.checked_sub(elapsed) {
            if !remaining.is_zero() {
                info!(
                    "boot guard: waiting {:.1}s to clear the IPI detection window",
                    remaining.as_secs_f64()
                );
                if cancel.wait_for(clock, remaining, slice) == WaitOutcome::Cancelled {
                    return Err(Error::Cancelled);
                }
            }
        }
        self.satisfied = true;
        Ok(())
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }
}
