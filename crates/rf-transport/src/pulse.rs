//! Fixed-code 433MHz transmission by bit-banging a GPIO line.
//!
//! Each bit is a high/low waveform whose widths are multiples of the
//! protocol's pulse length. A code is sent MSB first, followed by a sync
//! waveform, and the whole word is repeated to ride out interference.

use crate::{BackendInfo, Gpio, Level, PinNumbering, Result, RfTransmitter, TransportError};

/// Waveform ratios of one fixed-code protocol, in units of `pulse_length_us`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RfProtocol {
    pub pulse_length_us: u64,
    pub sync: (u64, u64),
    pub zero: (u64, u64),
    pub one: (u64, u64),
}

const PROTOCOLS: [RfProtocol; 6] = [
    RfProtocol { pulse_length_us: 350, sync: (1, 31), zero: (1, 3), one: (3, 1) },
    RfProtocol { pulse_length_us: 650, sync: (1, 10), zero: (1, 2), one: (2, 1) },
    RfProtocol { pulse_length_us: 100, sync: (30, 71), zero: (4, 11), one: (9, 6) },
    RfProtocol { pulse_length_us: 380, sync: (1, 6), zero: (1, 3), one: (3, 1) },
    RfProtocol { pulse_length_us: 500, sync: (6, 14), zero: (1, 2), one: (2, 1) },
    RfProtocol { pulse_length_us: 200, sync: (1, 10), zero: (1, 5), one: (1, 1) },
];

impl RfProtocol {
    /// Look up protocol `1..=6`.
    pub fn by_number(n: u8) -> Result<Self> {
        usize::from(n)
            .checked_sub(1)
            .and_then(|i| PROTOCOLS.get(i))
            .copied()
            .ok_or(TransportError::UnknownProtocol(n))
    }
}

impl Default for RfProtocol {
    fn default() -> Self {
        PROTOCOLS[0]
    }
}

pub const DEFAULT_CODE_BITS: u32 = 24;
pub const DEFAULT_REPEAT: u32 = 10;
/// Largest code that fits the widest (32-bit) word
pub const MAX_CODE: u64 = u32::MAX as u64;

/// [`RfTransmitter`] that drives a data pin of a plain ASK/OOK transmitter module.
pub struct PulseTransmitter<G: Gpio> {
    gpio: G,
    pin: u8,
    protocol: RfProtocol,
    repeat: u32,
    code_bits: u32,
    enabled: bool,
}

impl<G: Gpio> PulseTransmitter<G> {
    pub fn new(gpio: G, pin: u8) -> Self {
        Self {
            gpio,
            pin,
            protocol: RfProtocol::default(),
            repeat: DEFAULT_REPEAT,
            code_bits: DEFAULT_CODE_BITS,
            enabled: false,
        }
    }

    pub fn with_protocol(mut self, protocol: RfProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Bits of `code`, MSB first. Codes above 2^24 are widened to 32 bits;
    /// bits above [`MAX_CODE`] are not representable and callers must reject them.
    pub fn code_bits(&self, code: u64) -> Vec<bool> {
        let width = if code > (1 << 24) {
            32
        } else {
            self.code_bits
        };
        (0..width).rev().map(|i| (code >> i) & 1 == 1).collect()
    }

    fn waveform(&mut self, (high, low): (u64, u64)) -> Result<()> {
        let unit = self.protocol.pulse_length_us;
        self.gpio.write(self.pin, Level::High)?;
        self.gpio.delay_us(high * unit);
        self.gpio.write(self.pin, Level::Low)?;
        self.gpio.delay_us(low * unit);
        Ok(())
    }

    fn transmit(&mut self, bits: &[bool]) -> Result<()> {
        for _ in 0..self.repeat {
            for &bit in bits {
                let shape = if bit {
                    self.protocol.one
                } else {
                    self.protocol.zero
                };
                self.waveform(shape)?;
            }
            self.waveform(self.protocol.sync)?;
        }
        Ok(())
    }
}

impl<G: Gpio> RfTransmitter for PulseTransmitter<G> {
    fn info(&self) -> BackendInfo {
        let inner = self.gpio.info();
        BackendInfo {
            name: format!("{}:{}", inner.name, self.pin),
            driver: format!("pulse/{}", inner.driver),
        }
    }

    fn enable_transmit(&mut self) -> Result<()> {
        self.gpio.set_mode(PinNumbering::Bcm)?;
        self.gpio.configure_output(self.pin)?;
        self.enabled = true;
        Ok(())
    }

    fn send_code(&mut self, code: u64) -> bool {
        if !self.enabled {
            tracing::error!(pin = self.pin, "transmit mode not enabled, code not sent");
            return false;
        }
        if code > MAX_CODE {
            tracing::error!(code, "code wider than 32 bits, not sent");
            return false;
        }
        let bits = self.code_bits(code);
        match self.transmit(&bits) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(code, error = %e, "code transmission aborted");
                false
            }
        }
    }

    fn release(&mut self) {
        if self.enabled {
            self.enabled = false;
            self.gpio.release_all();
        }
    }
}

impl<G: Gpio> Drop for PulseTransmitter<G> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{GpioEvent, MockGpio};

    #[test]
    fn test_protocol_lookup() {
        assert_eq!(RfProtocol::by_number(1).unwrap().pulse_length_us, 350);
        assert_eq!(RfProtocol::by_number(6).unwrap().zero, (1, 5));
        assert!(RfProtocol::by_number(0).is_err());
        assert!(RfProtocol::by_number(7).is_err());
    }

    #[test]
    fn test_code_bits_width() {
        let tx = PulseTransmitter::new(MockGpio::new(), 17);
        let bits = tx.code_bits(4793);
        assert_eq!(bits.len(), 24);
        // 4793 = 0b1_0010_1011_1001
        assert!(bits[23]);
        assert!(!bits[22]);
        assert!(bits[11]);
        assert_eq!(tx.code_bits((1 << 24) + 1).len(), 32);
    }

    #[test]
    fn test_send_requires_enable() {
        let mut tx = PulseTransmitter::new(MockGpio::new(), 17);
        let rec = tx.gpio().recorder();
        assert!(!tx.send_code(1));
        assert!(rec.writes(17).is_empty());
    }

    #[test]
    fn test_oversized_code_is_not_sent() -> anyhow::Result<()> {
        let mut tx = PulseTransmitter::new(MockGpio::new(), 17);
        let rec = tx.gpio().recorder();
        tx.enable_transmit()?;
        assert!(!tx.send_code(MAX_CODE + 2));
        assert!(rec.writes(17).is_empty());
        assert!(tx.send_code(MAX_CODE));
        Ok(())
    }

    #[test]
    fn test_send_code_waveform() -> anyhow::Result<()> {
        let mut tx = PulseTransmitter::new(MockGpio::new(), 17).with_repeat(2);
        let rec = tx.gpio().recorder();
        tx.enable_transmit()?;
        assert!(tx.send_code(5));
        // (24 bits + sync) per repeat, two writes per waveform
        assert_eq!(rec.writes(17).len(), 2 * 25 * 2);
        let zero = (1 + 3) * 350;
        let one = (3 + 1) * 350;
        let sync = (1 + 31) * 350;
        assert_eq!(rec.total_delay_us(), 2 * (22 * zero + 2 * one + sync));
        tx.release();
        tx.release();
        assert_eq!(rec.count(GpioEvent::ReleaseAll), 1);
        Ok(())
    }
}
