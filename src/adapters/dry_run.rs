//! Dry-run output bank.
//!
//! Accepts the exact same claim/write sequence as the real bank but
//! suppresses the physical side effect, logging each write instead. The
//! driver and sequencers are oblivious, so a dry run exercises identical
//! sequencing and timing against zero hardware -- the dry-run parity
//! property.

use std::sync::{Arc, Mutex};

use log::info;

use crate::error::GpioError;
use crate::ports::{Level, OutputBank};

/// One suppressed physical write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressedWrite {
    pub pin: u8,
    pub level: Level,
}

/// Output bank that records and logs writes instead of applying them.
#[derive(Debug, Clone, Default)]
pub struct DryRunBank {
    log: Arc<Mutex<Vec<SuppressedWrite>>>,
}

impl DryRunBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write the sequencing core issued, in order.
    pub fn writes(&self) -> Vec<SuppressedWrite> {
        self.log.lock().expect("dry-run log poisoned").clone()
    }
}

impl OutputBank for DryRunBank {
    fn claim(&mut self, pin: u8, initial: Level) -> Result<(), GpioError> {
        info!("[dry-run] claim pin={pin} initial={initial:?}");
        self.log
            .lock()
            .expect("dry-run log poisoned")
            .push(SuppressedWrite {
                pin,
                level: initial,
            });
        Ok(())
    }

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        info!("[dry-run] pin={pin} -> {level:?}");
        self.log
            .lock()
            .expect("dry-run log poisoned")
            .push(SuppressedWrite { pin, level });
        Ok(())
    }
}
