use crate::{BackendInfo, Level, PinNumbering, Result};
use std::time::Duration;

/// A minimal blocking GPIO interface for output-only radio work.
pub trait Gpio {
    /// Describe the backend (name and driver).
    fn info(&self) -> BackendInfo;

    /// Select the pin numbering scheme. Calling it again with the same scheme is a no-op.
    fn set_mode(&mut self, mode: PinNumbering) -> Result<()>;

    /// Claim `pin` as an output. Re-configuring an already claimed pin is a no-op.
    fn configure_output(&mut self, pin: u8) -> Result<()>;

    /// Drive `pin` to `level`.
    fn write(&mut self, pin: u8, level: Level) -> Result<()>;

    /// Hold the current levels for `us` microseconds.
    ///
    /// The default sleeps the calling thread, so accuracy is bounded by the OS
    /// scheduler and is not guaranteed below a millisecond.
    fn delay_us(&mut self, us: u64) {
        std::thread::sleep(Duration::from_micros(us));
    }

    /// Release every pin claimed through this handle.
    fn release_all(&mut self);
}

/// A 433MHz transmitter that sends fixed decimal codes.
pub trait RfTransmitter {
    /// Describe the backend (name and driver).
    fn info(&self) -> BackendInfo;

    /// Put the radio into transmit mode.
    fn enable_transmit(&mut self) -> Result<()>;

    /// Transmit `code` once; returns whether the driver acknowledged it.
    fn send_code(&mut self, code: u64) -> bool;

    /// Leave transmit mode and free the pin. Releasing twice is a no-op.
    fn release(&mut self);
}

impl<G: Gpio + ?Sized> Gpio for Box<G> {
    fn info(&self) -> BackendInfo {
        (**self).info()
    }

    fn set_mode(&mut self, mode: PinNumbering) -> Result<()> {
        (**self).set_mode(mode)
    }

    fn configure_output(&mut self, pin: u8) -> Result<()> {
        (**self).configure_output(pin)
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<()> {
        (**self).write(pin, level)
    }

    fn delay_us(&mut self, us: u64) {
        (**self).delay_us(us)
    }

    fn release_all(&mut self) {
        (**self).release_all()
    }
}

impl<R: RfTransmitter + ?Sized> RfTransmitter for Box<R> {
    fn info(&self) -> BackendInfo {
        (**self).info()
    }

    fn enable_transmit(&mut self) -> Result<()> {
        (**self).enable_transmit()
    }

    fn send_code(&mut self, code: u64) -> bool {
        (**self).send_code(code)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
