//! Session configuration parameters.
//!
//! All tunable timings for an actuation session. The maintained-call
//! numbers (1 s / 250 ms / 250 ms) and the 12 s boot guard come straight
//! from observed vendor behaviour of the IPI module; they are preserved
//! exactly as defaults and must not be re-derived.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::call::CallTimings;

/// Core session configuration. All values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    // --- Boot guard ---
    /// Minimum time since power-on before the first ACTIVE transition,
    /// covering the IPI's post-power diagnostic pulse window.
    pub boot_guard_ms: u64,

    // --- Qualified pulse (ignite) ---
    /// Default ignition pulse width.
    pub ignite_pulse_ms: u64,
    /// Lower bound of the qualified-edge window; shorter pulses are
    /// rejected by the IPI as noise.
    pub ignite_pulse_min_ms: u64,
    /// Upper bound of the qualified-edge window; longer closures look
    /// like a static short.
    pub ignite_pulse_max_ms: u64,

    // --- Probe (bench click-test) ---
    /// Default probe pulse width.
    pub probe_pulse_ms: u64,
    /// Default INACTIVE settle after each probe activation.
    pub probe_post_open_ms: u64,

    // --- Maintained call ---
    /// DROP_OPEN phase: hold INACTIVE before re-qualifying.
    pub drop_open_ms: u64,
    /// REQUALIFY_CLOSE phase: brief ACTIVE edge.
    pub requalify_close_ms: u64,
    /// REQUALIFY_OPEN phase: brief INACTIVE before the sustained hold.
    pub requalify_open_ms: u64,

    // --- Scheduling ---
    /// Sleep-slice granularity; the longest delay before a cancellation
    /// takes effect.
    pub cancel_poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            boot_guard_ms: 12_000,

            ignite_pulse_ms: 250,
            ignite_pulse_min_ms: 200,
            ignite_pulse_max_ms: 300,

            probe_pulse_ms: 300,
            probe_post_open_ms: 500,

            drop_open_ms: 1_000,
            requalify_close_ms: 250,
            requalify_open_ms: 250,

            cancel_poll_ms: 100,
        }
    }
}

impl SessionConfig {
    pub fn boot_guard(&self) -> Duration {
        Duration::from_millis(self.boot_guard_ms)
    }

    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.cancel_poll_ms)
    }

    /// Clamp a requested ignite pulse into the qualified-edge window.
    pub fn qualified_pulse(&self, requested_ms: u64) -> Duration {
        Duration::from_millis(requested_ms.clamp(self.ignite_pulse_min_ms, self.ignite_pulse_max_ms))
    }

    /// Maintained-call phase durations.
    pub fn call_timings(&self) -> CallTimings {
        CallTimings {
            drop_open: Duration::from_millis(self.drop_open_ms),
            requalify_close: Duration::from_millis(self.requalify_close_ms),
            requalify_open: Duration::from_millis(self.requalify_open_ms),
        }
    }
}
