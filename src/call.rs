//! Maintained call -- the multi-phase re-qualification state machine.
//!
//! Some units drop the burner a few seconds after a single qualified
//! pulse; the documented workaround re-qualifies the call and then holds
//! it closed:
//!
//! ```text
//! IDLE --start--> DROP_OPEN        (INACTIVE, 1 s)
//! DROP_OPEN      --elapsed--> REQUALIFY_CLOSE (ACTIVE, 250 ms)
//! REQUALIFY_CLOSE --elapsed--> REQUALIFY_OPEN (INACTIVE, 250 ms)
//! REQUALIFY_OPEN --elapsed--> HOLDING         (ACTIVE, indefinite)
//! HOLDING   --release--> SHUTTING_DOWN        (INACTIVE)
//! SHUTTING_DOWN --immediate--> SAFE_OPEN      (terminal, INACTIVE)
//! ```
//!
//! The machine is an explicit `state + release flag -> next state`
//! function polled by a cooperative loop, so the rule "a release signal
//! in *any* state goes straight to SHUTTING_DOWN" is one testable
//! transition instead of scattered handlers. SAFE_OPEN is idempotent and
//! absorbing.

use std::time::Duration;

use log::{info, warn};

use crate::cancel::CancelToken;
use crate::driver::{LogicalState, PolarityDriver};
use crate::error::Result;
use crate::ports::{Clock, OutputBank};
use crate::registry::Relay;
use crate::sequencer::Outcome;

// ---------------------------------------------------------------------------
// Timings
// ---------------------------------------------------------------------------

/// Scripted phase durations. The defaults are empirically derived from
/// vendor behaviour; do not tune them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimings {
    pub drop_open: Duration,
    pub requalify_close: Duration,
    pub requalify_open: Duration,
}

impl Default for CallTimings {
    fn default() -> Self {
        Self {
            drop_open: Duration::from_secs(1),
            requalify_close: Duration::from_millis(250),
            requalify_open: Duration::from_millis(250),
        }
    }
}

// ---------------------------------------------------------------------------
// State machine (pure)
// ---------------------------------------------------------------------------

/// Maintained-call session state. Owned exclusively by the active
/// session; discarded when the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    DropOpen,
    RequalifyClose,
    RequalifyOpen,
    Holding,
    ShuttingDown,
    SafeOpen,
}

/// How long a state dwells before its time-triggered transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dwell {
    /// Advance after the duration elapses.
    Timed(Duration),
    /// No automatic timeout; leaves only on an external release.
    UntilRelease,
    /// Advance immediately.
    Immediate,
}

impl CallState {
    /// Relay level asserted on entering this state. `None` for states
    /// with no side effect of their own.
    pub fn level(self) -> Option<LogicalState> {
        match self {
            Self::Idle => None,
            Self::DropOpen | Self::RequalifyOpen | Self::ShuttingDown | Self::SafeOpen => {
                Some(LogicalState::Inactive)
            }
            Self::RequalifyClose | Self::Holding => Some(LogicalState::Active),
        }
    }

    /// Dwell before the next time-triggered transition.
    pub fn dwell(self, t: &CallTimings) -> Dwell {
        match self {
            Self::DropOpen => Dwell::Timed(t.drop_open),
            Self::RequalifyClose => Dwell::Timed(t.requalify_close),
            Self::RequalifyOpen => Dwell::Timed(t.requalify_open),
            Self::Holding => Dwell::UntilRelease,
            Self::Idle | Self::ShuttingDown | Self::SafeOpen => Dwell::Immediate,
        }
    }

    /// The single transition function. A release signal in any state is
    /// treated as arriving in HOLDING: straight to SHUTTING_DOWN,
    /// skipping remaining scripted phases.
    pub fn advance(self, release: bool) -> CallState {
        if release {
            return match self {
                Self::ShuttingDown | Self::SafeOpen => Self::SafeOpen,
                _ => Self::ShuttingDown,
            };
        }
        match self {
            Self::Idle => Self::DropOpen,
            Self::DropOpen => Self::RequalifyClose,
            Self::RequalifyClose => Self::RequalifyOpen,
            Self::RequalifyOpen => Self::Holding,
            // No automatic timeout; only a release ends the hold.
            Self::Holding => Self::Holding,
            Self::ShuttingDown => Self::SafeOpen,
            Self::SafeOpen => Self::SafeOpen,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::SafeOpen
    }
}

// ---------------------------------------------------------------------------
// Session runner
// ---------------------------------------------------------------------------

/// One maintained-call session against a single relay.
pub struct MaintainedCall<'a, B: OutputBank, C: Clock> {
    driver: &'a mut PolarityDriver<B>,
    clock: &'a C,
    cancel: &'a CancelToken,
    slice: Duration,
    timings: CallTimings,
    state: CallState,
}

impl<'a, B: OutputBank, C: Clock> MaintainedCall<'a, B, C> {
    pub fn new(
        driver: &'a mut PolarityDriver<B>,
        clock: &'a C,
        cancel: &'a CancelToken,
        slice: Duration,
        timings: CallTimings,
    ) -> Self {
        Self {
            driver,
            clock,
            cancel,
            slice,
            timings,
            state: CallState::Idle,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Run the session to SAFE_OPEN. `hold_for` bounds the HOLDING phase;
    /// `None` holds until cancellation.
    pub fn run(&mut self, relay: &Relay, hold_for: Option<Duration>) -> Result<Outcome> {
        // "Desired off" latch: set by an elapsed hold as well as by the
        // cancel token. Once true the machine can only move toward
        // SAFE_OPEN and never re-enters HOLDING.
        let mut release = false;

        while !self.state.is_terminal() {
            let next = self.state.advance(release || self.cancel.is_cancelled());
            if next != self.state {
                info!("maintained call: {:?} -> {:?}", self.state, next);
                self.state = next;
            }

            if let Some(level) = self.state.level() {
                if let Err(e) = self.driver.set_logical(relay, level) {
                    warn!("maintained call aborting in {:?}: {e}", self.state);
                    self.driver.force_all_inactive();
                    return Err(e.into());
                }
            }

            match self.state.dwell(&self.timings) {
                Dwell::Timed(d) => {
                    // A cancellation mid-dwell is observed by the next
                    // advance; the dwell is the bound on its latency.
                    let _ = self.cancel.wait_for(self.clock, d, self.slice);
                }
                Dwell::UntilRelease => {
                    if hold_for.is_none() {
                        info!(
                            "maintained call active on '{}'; Ctrl+C to shut down",
                            relay.name
                        );
                    }
                    let _ = self
                        .cancel
                        .wait_until_released(self.clock, hold_for, self.slice);
                    release = true;
                }
                Dwell::Immediate => {}
            }
        }

        Ok(if self.cancel.is_cancelled() {
            Outcome::Cancelled
        } else {
            Outcome::Completed
        })
    }

    /// Force the session to SAFE_OPEN. Idempotent; calling it on an
    /// already-terminal session has no further effect.
    pub fn shutdown(&mut self) {
        if !self.state.is_terminal() {
            info!("maintained call: {:?} -> SafeOpen (shutdown)", self.state);
            self.state = CallState::SafeOpen;
        }
        self.driver.force_all_inactive();
    }
}
