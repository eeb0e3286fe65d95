//! Raspberry Pi GPIO bank (the only module that touches real hardware).
//!
//! One `rppal` output pin per claimed BCM number. The initial level is
//! applied as part of the claim, so a pin never sits at the wrong level
//! between acquisition and the first scheduled write -- important on
//! active-low hats where a floating or defaulted-low pin would energise
//! the relay.

use std::collections::HashMap;

use rppal::gpio::{Gpio, OutputPin};

use crate::error::GpioError;
use crate::ports::{Level, OutputBank};

/// Real GPIO output bank backed by the Pi's gpiochip.
pub struct RpiBank {
    gpio: Gpio,
    pins: HashMap<u8, OutputPin>,
}

impl RpiBank {
    /// Acquire the GPIO peripheral. Fails off-Pi or without permissions.
    pub fn new() -> Result<Self, GpioError> {
        let gpio = Gpio::new().map_err(|e| GpioError::AcquireFailed {
            pin: 0,
            detail: format!("GPIO peripheral unavailable: {e}"),
        })?;
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }
}

impl OutputBank for RpiBank {
    fn claim(&mut self, pin: u8, initial: Level) -> Result<(), GpioError> {
        let io = self
            .gpio
            .get(pin)
            .map_err(|e| GpioError::AcquireFailed {
                pin,
                detail: e.to_string(),
            })?;
        let out = match initial {
            Level::High => io.into_output_high(),
            Level::Low => io.into_output_low(),
        };
        self.pins.insert(pin, out);
        Ok(())
    }

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        let out = self.pins.get_mut(&pin).ok_or_else(|| GpioError::WriteFailed {
            pin,
            detail: "pin was never claimed".to_string(),
        })?;
        match level {
            Level::High => out.set_high(),
            Level::Low => out.set_low(),
        }
        Ok(())
    }
}
