use crate::types::{Device, SwitchState};
use crate::{Rc433Error, Rc433Service, Result};
use rf_transport::RfTransmitter;

/// Sends the learned on/off code of a [`CodeDevice`](crate::CodeDevice).
///
/// The transmitter is enabled on first use and kept enabled until
/// [`release`](Self::release) or drop.
pub struct DecimalCodeTransmitter<R: RfTransmitter> {
    rf: R,
    enabled: bool,
}

impl<R: RfTransmitter> DecimalCodeTransmitter<R> {
    /// Sends per switch; any single acknowledgment counts as success.
    pub const ATTEMPTS: usize = 5;

    pub fn new(rf: R) -> Self {
        Self { rf, enabled: false }
    }

    pub fn transmitter(&self) -> &R {
        &self.rf
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn initialize(&mut self) -> Result<()> {
        if !self.enabled {
            self.rf.enable_transmit()?;
            self.enabled = true;
            tracing::debug!(backend = self.rf.info().name.as_str(), "rf transmitter enabled");
        }
        Ok(())
    }

    /// Send `code` [`ATTEMPTS`](Self::ATTEMPTS) times; true if any attempt was acknowledged.
    pub fn send_code(&mut self, code: u64) -> Result<bool> {
        self.initialize()?;
        tracing::debug!(code, "sending code");
        let mut acked = false;
        for _ in 0..Self::ATTEMPTS {
            // every attempt goes out, even after an acknowledgment
            acked |= self.rf.send_code(code);
        }
        Ok(acked)
    }

    /// Leave transmit mode. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.enabled {
            self.rf.release();
            self.enabled = false;
            tracing::debug!("rf transmitter released");
        }
    }
}

impl<R: RfTransmitter> Rc433Service for DecimalCodeTransmitter<R> {
    fn name(&self) -> &'static str {
        "decimal-code"
    }

    fn applicable(&self, device: &Device) -> bool {
        matches!(device, Device::Code(_))
    }

    fn transmit(&mut self, device: &Device, state: SwitchState) -> Result<bool> {
        let Device::Code(dev) = device else {
            return Err(Rc433Error::UnsupportedDevice {
                kind: device.kind().name(),
            });
        };
        let code = match state {
            SwitchState::On => dev.code_on,
            SwitchState::Off => dev.code_off,
        };
        let acked = self.send_code(code)?;
        if !acked {
            tracing::warn!(
                device = dev.device_name.as_str(),
                code,
                "no attempt acknowledged"
            );
        }
        Ok(acked)
    }
}

impl<R: RfTransmitter> Drop for DecimalCodeTransmitter<R> {
    fn drop(&mut self) {
        self.release();
    }
}
