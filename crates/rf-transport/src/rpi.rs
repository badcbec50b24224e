use crate::{BackendInfo, Gpio, Level, PinNumbering, Result, TransportError};
use rppal::gpio::{Gpio as RppalGpio, OutputPin};
use std::collections::HashMap;

/// Raspberry Pi GPIO through `/dev/gpiomem` (BCM numbering only)
pub struct RpiGpio {
    gpio: RppalGpio,
    pins: HashMap<u8, OutputPin>,
}

impl RpiGpio {
    pub fn open() -> Result<Self> {
        let gpio = RppalGpio::new().map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }
}

impl Gpio for RpiGpio {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "gpiomem".to_string(),
            driver: "rppal".to_string(),
        }
    }

    fn set_mode(&mut self, mode: PinNumbering) -> Result<()> {
        match mode {
            PinNumbering::Bcm => Ok(()),
            PinNumbering::Board => Err(TransportError::Unsupported(
                "rppal addresses pins by BCM number only",
            )),
        }
    }

    fn configure_output(&mut self, pin: u8) -> Result<()> {
        if self.pins.contains_key(&pin) {
            return Ok(());
        }
        let out = self
            .gpio
            .get(pin)
            .map_err(|_| TransportError::PinUnavailable(pin))?
            .into_output_low();
        tracing::debug!(pin, "claimed gpio output");
        self.pins.insert(pin, out);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<()> {
        let out = self
            .pins
            .get_mut(&pin)
            .ok_or(TransportError::NotConfigured(pin))?;
        match level {
            Level::High => out.set_high(),
            Level::Low => out.set_low(),
        }
        Ok(())
    }

    fn release_all(&mut self) {
        // OutputPin restores the previous pin mode when dropped
        let n = self.pins.len();
        self.pins.clear();
        if n > 0 {
            tracing::debug!(pins = n, "released gpio outputs");
        }
    }
}

impl Drop for RpiGpio {
    fn drop(&mut self) {
        self.release_all();
    }
}
