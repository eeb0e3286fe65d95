//! Host clock adapter.
//!
//! [`MonotonicClock`] measures from process start with `std::time::Instant`
//! and sleeps with the OS scheduler. [`system_uptime`] reads
//! `/proc/uptime` so the boot guard can measure from power-on rather than
//! process start; on platforms without procfs it simply returns `None`
//! and the guard falls back to the process clock.

use std::time::{Duration, Instant};

use crate::ports::Clock;

/// Monotonic wall clock, origin at construction (process start).
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Seconds since system power-on, if the platform exposes them.
pub fn system_uptime() -> Option<Duration> {
    let text = std::fs::read_to_string("/proc/uptime").ok()?;
    let first = text.split_whitespace().next()?;
    let secs: f64 = first.parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}
