//! Port traits -- the boundary between the timing core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ sequencing core
//! ```
//!
//! Driven adapters (real Pi GPIO, dry-run, test mocks) implement
//! [`OutputBank`]; the sequencing core consumes it via generics and never
//! touches hardware directly. [`Clock`] abstracts monotonic time so every
//! timed path can be exercised with a fake clock on the host.

use std::time::Duration;

use crate::error::GpioError;

// ───────────────────────────────────────────────────────────────
// Physical output level
// ───────────────────────────────────────────────────────────────

/// Physical voltage level on an output pin. Deliberately distinct from
/// [`LogicalState`](crate::driver::LogicalState): which level energises
/// the relay depends on the board's polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

// ───────────────────────────────────────────────────────────────
// Output bank port (driven adapter: core → GPIO device)
// ───────────────────────────────────────────────────────────────

/// Write-side port: a digital-output device addressed by BCM pin number.
///
/// Pins must be claimed before they are written. `claim` applies
/// `initial` in the same operation so the pin never floats at the wrong
/// level between acquisition and the first scheduled write.
pub trait OutputBank {
    /// Acquire a pin for output and drive it to `initial`.
    fn claim(&mut self, pin: u8, initial: Level) -> Result<(), GpioError>;

    /// Drive a previously claimed pin.
    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source with a cooperative sleep.
///
/// The core only ever sleeps in short slices (see
/// [`CancelToken::wait_for`](crate::cancel::CancelToken::wait_for)), so a
/// fake clock that advances on `sleep` makes every timed test instant.
pub trait Clock {
    /// Monotonic time since some fixed origin (process start for the real
    /// clock).
    fn now(&self) -> Duration;

    /// Suspend the calling thread for `d`.
    fn sleep(&self, d: Duration);
}
