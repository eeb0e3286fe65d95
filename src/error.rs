//! Unified error types for the fireplace controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command dispatcher's error handling uniform. Configuration problems are
//! fatal before any relay is driven; GPIO failures abort the in-progress
//! sequence after one forced return to INACTIVE; cancellation is the only
//! locally recovered case and is surfaced as an `Outcome`, not an error,
//! at the dispatch boundary.

use std::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Relay bindings or command arguments are invalid. Raised before any
    /// actuation; no relay is ever driven on this path.
    Config(ConfigError),
    /// The GPIO device could not be acquired or a write failed.
    Gpio(GpioError),
    /// The command was interrupted mid-sequence. The fail-safe shutdown
    /// path has already run by the time this surfaces.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Gpio(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A relay name was registered twice.
    DuplicateName(String),
    /// A BCM pin is already bound to a different relay name.
    PinAlreadyBound { pin: u8, name: String },
    /// A relay reference did not match any registered name, alias,
    /// or bare BCM pin number.
    UnknownRelay(String),
    /// A required relay reference was not supplied (flag or env var).
    MissingRelay(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "relay '{name}' already registered"),
            Self::PinAlreadyBound { pin, name } => {
                write!(f, "BCM pin {pin} already bound to relay '{name}'")
            }
            Self::UnknownRelay(r) => write!(f, "unknown relay '{r}'"),
            Self::MissingRelay(hint) => write!(f, "no relay given: {hint}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO access errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// The output device for a pin could not be acquired.
    AcquireFailed { pin: u8, detail: String },
    /// A level write to an already-acquired pin failed.
    WriteFailed { pin: u8, detail: String },
    /// This build has no real GPIO backend (compiled without the `rpi`
    /// feature) and the command was not a dry run.
    Unavailable(&'static str),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquireFailed { pin, detail } => {
                write!(f, "failed to acquire BCM pin {pin}: {detail}")
            }
            Self::WriteFailed { pin, detail } => {
                write!(f, "write to BCM pin {pin} failed: {detail}")
            }
            Self::Unavailable(msg) => write!(f, "GPIO unavailable: {msg}"),
        }
    }
}

impl std::error::Error for GpioError {}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
