//! Mock hardware adapters for integration tests.
//!
//! [`ScriptClock`] is a fake monotonic clock whose `sleep` advances time
//! instantly and can trip a cancel token at a preset instant, so
//! cancellation can be injected mid-phase deterministically.
//! [`RelayBank`] records every claim/write with its timestamp so tests
//! can assert on the full actuation history without touching real GPIO.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fireplace::cancel::CancelToken;
use fireplace::error::GpioError;
use fireplace::ports::{Clock, Level, OutputBank};

// ── ScriptClock ───────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ScriptClock {
    now: Arc<Mutex<Duration>>,
    trip: Arc<Mutex<Option<(Duration, CancelToken)>>>,
}

#[allow(dead_code)]
impl ScriptClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token` once the clock passes `at`.
    pub fn cancel_at(&self, at: Duration, token: &CancelToken) {
        *self.trip.lock().unwrap() = Some((at, token.clone()));
    }
}

impl Clock for ScriptClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, d: Duration) {
        let now = {
            let mut now = self.now.lock().unwrap();
            *now += d;
            *now
        };
        if let Some((at, token)) = self.trip.lock().unwrap().as_ref() {
            if now >= *at {
                token.cancel();
            }
        }
    }
}

// ── RelayBank ─────────────────────────────────────────────────

/// One recorded physical operation.
pub type WriteRecord = (u8, Level, Duration);

#[derive(Clone)]
pub struct RelayBank {
    clock: ScriptClock,
    writes: Arc<Mutex<Vec<WriteRecord>>>,
    fail_level: Arc<Mutex<Option<Level>>>,
}

#[allow(dead_code)]
impl RelayBank {
    pub fn new(clock: &ScriptClock) -> Self {
        Self {
            clock: clock.clone(),
            writes: Arc::new(Mutex::new(Vec::new())),
            fail_level: Arc::new(Mutex::new(None)),
        }
    }

    /// Every operation in issue order, timestamped.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.writes.lock().unwrap().clone()
    }

    /// `(pin, level)` sequence without timestamps, for parity checks.
    pub fn sequence(&self) -> Vec<(u8, Level)> {
        self.writes().iter().map(|w| (w.0, w.1)).collect()
    }

    /// Level history of a single pin.
    pub fn levels_for(&self, pin: u8) -> Vec<Level> {
        self.writes()
            .iter()
            .filter(|w| w.0 == pin)
            .map(|w| w.1)
            .collect()
    }

    /// Make every write of `level` fail (fault injection).
    pub fn fail_writes_of(&self, level: Level) {
        *self.fail_level.lock().unwrap() = Some(level);
    }
}

impl OutputBank for RelayBank {
    fn claim(&mut self, pin: u8, initial: Level) -> Result<(), GpioError> {
        self.write_level(pin, initial)
    }

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        if *self.fail_level.lock().unwrap() == Some(level) {
            return Err(GpioError::WriteFailed {
                pin,
                detail: "injected fault".to_string(),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push((pin, level, self.clock.now()));
        Ok(())
    }
}

/// No two pins may ever be at ACTIVE level simultaneously (ACTIVE-HIGH
/// convention assumed by the caller).
#[allow(dead_code)]
pub fn assert_no_overlap(writes: &[WriteRecord]) {
    let mut high: Vec<u8> = Vec::new();
    for (pin, level, at) in writes {
        match level {
            Level::High => {
                assert!(
                    high.is_empty(),
                    "pin {pin} went ACTIVE at {at:?} while {high:?} still ACTIVE"
                );
                high.push(*pin);
            }
            Level::Low => high.retain(|p| p != pin),
        }
    }
}
