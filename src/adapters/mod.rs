//! Driven adapters behind the port traits.
//!
//! Everything that touches the outside world lives here: the real Pi
//! GPIO bank (feature-gated), the dry-run bank, and the monotonic clock.
//! The sequencing core only ever sees the traits in [`crate::ports`].

pub mod clock;
pub mod dry_run;

#[cfg(feature = "rpi")]
pub mod gpio;
