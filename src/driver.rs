//! Polarity-abstracting relay driver.
//!
//! Translates logical ACTIVE/INACTIVE intent into physical HIGH/LOW
//! writes. Polarity mapping is a pure function, kept separate from all
//! timing logic so it can be property-tested on its own.
//!
//! ## Fail-safe contract
//!
//! - On construction every managed relay is driven to physical INACTIVE
//!   before any other call is accepted.
//! - `force_all_inactive` is best-effort and never fails: write errors
//!   are logged so they cannot mask the error that triggered the
//!   shutdown.
//! - Dropping the driver forces INACTIVE again, so every exit path --
//!   completion, cancellation, error, panic unwind -- releases the call.

use std::collections::BTreeMap;

use log::{debug, error, info};

use crate::error::GpioError;
use crate::ports::{Level, OutputBank};
use crate::registry::Relay;

// ---------------------------------------------------------------------------
// Polarity mapping (pure)
// ---------------------------------------------------------------------------

/// Relay energisation convention, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Drive the pin HIGH to close the relay contact (KS0212 default).
    #[default]
    ActiveHigh,
    /// Drive the pin LOW to close the relay contact (many opto-isolated
    /// hats).
    ActiveLow,
}

/// Domain-level relay state, independent of voltage level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalState {
    /// Relay energised, contact closed.
    Active,
    /// Relay released, contact open.
    Inactive,
}

impl LogicalState {
    /// Domain label used in phase logs, matching the wiring docs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "CLOSE-ACTIVATE",
            Self::Inactive => "OPEN-DEACTIVATE",
        }
    }
}

/// The physical level that realises `state` under `polarity`:
/// the logical state XOR'd with the polarity flag.
pub fn physical_level(state: LogicalState, polarity: Polarity) -> Level {
    match (state, polarity) {
        (LogicalState::Active, Polarity::ActiveHigh)
        | (LogicalState::Inactive, Polarity::ActiveLow) => Level::High,
        (LogicalState::Active, Polarity::ActiveLow)
        | (LogicalState::Inactive, Polarity::ActiveHigh) => Level::Low,
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Owns the output bank for the duration of one actuation session.
///
/// Constructed once per session and handed to whichever sequencer is
/// active; no ambient singleton. Writes are idempotent: repeating the
/// same logical state for a pin is suppressed.
pub struct PolarityDriver<B: OutputBank> {
    bank: B,
    polarity: Polarity,
    managed: Vec<Relay>,
    /// Last logical state successfully written per pin. An entry is
    /// removed when a write fails so the forced-INACTIVE path retries it.
    last: BTreeMap<u8, LogicalState>,
}

impl<B: OutputBank> PolarityDriver<B> {
    /// Acquire every managed pin and force it INACTIVE.
    ///
    /// Duplicate pins in `relays` are claimed once; the registry already
    /// rejects duplicate bindings, but probe targets come straight from
    /// the CLI.
    pub fn new(bank: B, polarity: Polarity, relays: &[Relay]) -> Result<Self, GpioError> {
        let mut driver = Self {
            bank,
            polarity,
            managed: Vec::new(),
            last: BTreeMap::new(),
        };
        let inactive = physical_level(LogicalState::Inactive, polarity);
        for relay in relays {
            if driver.managed.iter().any(|r| r.pin == relay.pin) {
                continue;
            }
            driver.bank.claim(relay.pin, inactive)?;
            driver.last.insert(relay.pin, LogicalState::Inactive);
            driver.managed.push(relay.clone());
        }
        Ok(driver)
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Drive `relay` to `state`. No-op if the pin is already there.
    pub fn set_logical(&mut self, relay: &Relay, state: LogicalState) -> Result<(), GpioError> {
        if self.last.get(&relay.pin) == Some(&state) {
            debug!(
                "relay(pin={} name={}) already {}",
                relay.pin,
                relay.name,
                state.label()
            );
            return Ok(());
        }
        let level = physical_level(state, self.polarity);
        match self.bank.write_level(relay.pin, level) {
            Ok(()) => {
                info!(
                    "relay(pin={} name={}) -> {}",
                    relay.pin,
                    relay.name,
                    state.label()
                );
                self.last.insert(relay.pin, state);
                Ok(())
            }
            Err(e) => {
                // Hardware state is now unknown for this pin; make the
                // next forced write unconditional.
                self.last.remove(&relay.pin);
                Err(e)
            }
        }
    }

    /// Best-effort return of every managed relay to INACTIVE.
    ///
    /// Write failures are logged, never propagated, so the original
    /// error on an abort path is not masked.
    pub fn force_all_inactive(&mut self) {
        let inactive = physical_level(LogicalState::Inactive, self.polarity);
        for relay in &self.managed {
            if self.last.get(&relay.pin) == Some(&LogicalState::Inactive) {
                continue;
            }
            match self.bank.write_level(relay.pin, inactive) {
                Ok(()) => {
                    info!(
                        "relay(pin={} name={}) -> {} (forced)",
                        relay.pin,
                        relay.name,
                        LogicalState::Inactive.label()
                    );
                    self.last.insert(relay.pin, LogicalState::Inactive);
                }
                Err(e) => {
                    error!(
                        "forced INACTIVE write failed for relay(pin={} name={}): {e}",
                        relay.pin, relay.name
                    );
                }
            }
        }
    }
}

impl<B: OutputBank> Drop for PolarityDriver<B> {
    fn drop(&mut self) {
        self.force_all_inactive();
    }
}
