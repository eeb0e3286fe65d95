//! Pulse sequencer -- bounded OPEN→CLOSE→OPEN timing scripts.
//!
//! Produces the "qualified pulse": a single bounded excursion to ACTIVE
//! surrounded by INACTIVE phases, run against one or more relays strictly
//! in sequence (never two ACTIVE at once). Used by both the bench
//! click-test (`probe`) and real ignition (`ignite`).
//!
//! ## Guarantees
//!
//! - Cancellation truncates the ACTIVE hold but never skips the return
//!   to INACTIVE.
//! - A failed write aborts the run after one best-effort forced INACTIVE;
//!   the original error propagates un-masked.
//! - Zero durations are legal, skipped phases.

use std::time::Duration;

use log::info;

use crate::cancel::{CancelToken, WaitOutcome};
use crate::driver::{LogicalState, PolarityDriver};
use crate::error::Result;
use crate::ports::{Clock, OutputBank};
use crate::registry::Relay;

/// How a command run ended. Cancellation is a normal, non-fatal
/// completion distinct from success -- not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// One bounded open/close/open excursion, plus the inter-relay gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseScript {
    /// INACTIVE settle before the activation.
    pub open: Duration,
    /// ACTIVE hold (the pulse width).
    pub close: Duration,
    /// INACTIVE settle after the activation.
    pub post_open: Duration,
    /// INACTIVE gap between consecutive target relays.
    pub gap: Duration,
}

impl PulseScript {
    /// Bare qualified pulse: no settle phases, single relay.
    pub fn pulse(close: Duration) -> Self {
        Self {
            open: Duration::ZERO,
            close,
            post_open: Duration::ZERO,
            gap: Duration::ZERO,
        }
    }
}

/// Runs pulse scripts against a [`PolarityDriver`]. Exactly one sequencer
/// is active at a time; the caller serialises commands (the front-end
/// contract).
pub struct PulseSequencer<'a, B: OutputBank, C: Clock> {
    driver: &'a mut PolarityDriver<B>,
    clock: &'a C,
    cancel: &'a CancelToken,
    slice: Duration,
}

impl<'a, B: OutputBank, C: Clock> PulseSequencer<'a, B, C> {
    pub fn new(
        driver: &'a mut PolarityDriver<B>,
        clock: &'a C,
        cancel: &'a CancelToken,
        slice: Duration,
    ) -> Self {
        Self {
            driver,
            clock,
            cancel,
            slice,
        }
    }

    /// Run `script` once per target relay, in the supplied order.
    pub fn run(&mut self, targets: &[Relay], script: &PulseScript) -> Result<Outcome> {
        for (idx, relay) in targets.iter().enumerate() {
            if idx > 0 && self.wait(script.gap) == WaitOutcome::Cancelled {
                return Ok(Outcome::Cancelled);
            }

            // 1. Fail-safe settle: ensure deactivated before activation.
            self.set(relay, LogicalState::Inactive)?;
            self.log_phase(relay, LogicalState::Inactive, script.open);
            if self.wait(script.open) == WaitOutcome::Cancelled {
                return Ok(Outcome::Cancelled);
            }

            // 2. The qualified edge.
            self.set(relay, LogicalState::Active)?;
            self.log_phase(relay, LogicalState::Active, script.close);
            let cancelled = self.wait(script.close) == WaitOutcome::Cancelled;

            // 3. Return to INACTIVE -- issued even when the ACTIVE hold
            //    was truncated by cancellation.
            self.set(relay, LogicalState::Inactive)?;
            if cancelled {
                return Ok(Outcome::Cancelled);
            }

            self.log_phase(relay, LogicalState::Inactive, script.post_open);
            if self.wait(script.post_open) == WaitOutcome::Cancelled {
                return Ok(Outcome::Cancelled);
            }
        }
        Ok(Outcome::Completed)
    }

    /// Close `relay` and hold it, releasing on cancellation or after
    /// `hold_for`. No re-qualification phases; for units that drop the
    /// call without a maintained pattern use
    /// [`MaintainedCall`](crate::call::MaintainedCall) instead.
    pub fn hold(&mut self, relay: &Relay, hold_for: Option<Duration>) -> Result<Outcome> {
        self.set(relay, LogicalState::Inactive)?;
        // A cancellation that is already pending must not energise the
        // relay at all.
        if self.wait(Duration::ZERO) == WaitOutcome::Cancelled {
            return Ok(Outcome::Cancelled);
        }
        self.set(relay, LogicalState::Active)?;
        if hold_for.is_none() {
            info!("holding relay '{}' closed; Ctrl+C to release", relay.name);
        }
        let outcome = self
            .cancel
            .wait_until_released(self.clock, hold_for, self.slice);
        self.set(relay, LogicalState::Inactive)?;
        Ok(match outcome {
            WaitOutcome::Elapsed => Outcome::Completed,
            WaitOutcome::Cancelled => Outcome::Cancelled,
        })
    }

    fn set(&mut self, relay: &Relay, state: LogicalState) -> Result<()> {
        if let Err(e) = self.driver.set_logical(relay, state) {
            self.driver.force_all_inactive();
            return Err(e.into());
        }
        Ok(())
    }

    fn wait(&self, dur: Duration) -> WaitOutcome {
        self.cancel.wait_for(self.clock, dur, self.slice)
    }

    fn log_phase(&self, relay: &Relay, state: LogicalState, dur: Duration) {
        if !dur.is_zero() {
            info!(
                "pin {} ({}): {} for {:.2}s",
                relay.pin,
                relay.name,
                state.label(),
                dur.as_secs_f64()
            );
        }
    }
}
