//! Command model and dispatch.
//!
//! A [`Command`] is built by the CLI (or any front-end honouring the
//! same contract) from already-resolved relays, then handed to
//! [`SessionContext::execute`], which owns the boot guard and runs
//! exactly one sequencer at a time. The front-end serialises requests;
//! the core holds no queue.

use std::time::Duration;

use log::info;

use crate::boot_guard::BootGuard;
use crate::call::{CallTimings, MaintainedCall};
use crate::cancel::CancelToken;
use crate::config::SessionConfig;
use crate::driver::{Polarity, PolarityDriver};
use crate::error::{ConfigError, Error, Result};
use crate::ports::{Clock, OutputBank};
use crate::registry::Relay;
use crate::sequencer::{Outcome, PulseScript, PulseSequencer};

/// What a command does once its relays are driven fail-safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Bench click-test: run the script against every target in order.
    Probe { script: PulseScript },
    /// Ignition request: one qualified pulse, or the maintained-call
    /// pattern when `maintained` is set.
    Ignite {
        pulse: Duration,
        maintained: bool,
        hold_for: Option<Duration>,
    },
    /// Close the target and hold (no re-qualification phases).
    Hold { hold_for: Option<Duration> },
    /// Force the targets INACTIVE and exit. Constructing the driver
    /// already does this; the kind exists so `off`/`low` share the
    /// dispatch path.
    Release,
}

/// One fully resolved actuation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Ordered targets, already resolved against the registry.
    pub targets: Vec<Relay>,
    pub polarity: Polarity,
    /// Boot-guard threshold for this command. Zero skips the guard
    /// (probe runs on the bench with nothing wired to the fireplace).
    pub boot_guard: Duration,
}

/// Process-lifetime execution context: clock, cancel token, boot guard.
pub struct SessionContext<'a, C: Clock> {
    clock: &'a C,
    cancel: &'a CancelToken,
    guard: BootGuard,
    slice: Duration,
    timings: CallTimings,
}

impl<'a, C: Clock> SessionContext<'a, C> {
    /// Arm the context now. `uptime_credit` counts time spent before the
    /// process started (system uptime) toward the boot guard.
    pub fn new(
        clock: &'a C,
        cancel: &'a CancelToken,
        config: &SessionConfig,
        uptime_credit: Option<Duration>,
    ) -> Self {
        let guard = match uptime_credit {
            Some(credit) => BootGuard::with_elapsed(clock, credit),
            None => BootGuard::new(clock),
        };
        Self {
            clock,
            cancel,
            guard,
            slice: config.poll_slice(),
            timings: config.call_timings(),
        }
    }

    /// Run one command to completion, cancellation, or error.
    ///
    /// Every exit path leaves the relays INACTIVE: the driver forces
    /// them on construction, the sequencers on every abort path, and
    /// the driver's `Drop` backstops the rest.
    pub fn execute<B: OutputBank>(&mut self, cmd: &Command, bank: B) -> Result<Outcome> {
        if cmd.targets.is_empty() {
            return Err(ConfigError::MissingRelay("command needs at least one target").into());
        }

        info!(
            "executing {:?} on {:?} (polarity {:?})",
            cmd.kind,
            cmd.targets.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            cmd.polarity
        );

        let mut driver = PolarityDriver::new(bank, cmd.polarity, &cmd.targets)?;

        // Gate the first ACTIVE transition behind the IPI diagnostic
        // window. Cancellation here is a clean abort: nothing has gone
        // ACTIVE yet.
        match self
            .guard
            .ensure_safe(cmd.boot_guard, self.clock, self.cancel, self.slice)
        {
            Ok(()) => {}
            Err(Error::Cancelled) => return Ok(Outcome::Cancelled),
            Err(e) => return Err(e),
        }

        match &cmd.kind {
            CommandKind::Probe { script } => {
                PulseSequencer::new(&mut driver, self.clock, self.cancel, self.slice)
                    .run(&cmd.targets, script)
            }
            CommandKind::Ignite {
                pulse,
                maintained,
                hold_for,
            } => {
                let relay = &cmd.targets[0];
                if *maintained {
                    MaintainedCall::new(
                        &mut driver,
                        self.clock,
                        self.cancel,
                        self.slice,
                        self.timings,
                    )
                    .run(relay, *hold_for)
                } else {
                    PulseSequencer::new(&mut driver, self.clock, self.cancel, self.slice)
                        .run(std::slice::from_ref(relay), &PulseScript::pulse(*pulse))
                }
            }
            CommandKind::Hold { hold_for } => {
                PulseSequencer::new(&mut driver, self.clock, self.cancel, self.slice)
                    .hold(&cmd.targets[0], *hold_for)
            }
            CommandKind::Release => Ok(Outcome::Completed),
        }
    }
}
