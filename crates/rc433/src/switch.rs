use crate::encode::{build_frame, frame_pulses};
use crate::types::{Device, SwitchState};
use crate::{Rc433Error, Rc433Service, Result};
use rf_transport::{Gpio, Level, PinNumbering};

pub const DEFAULT_PIN: u8 = 17;

/// Tri-state encoder for DIP-switch addressed sockets.
///
/// There is no return channel, so each frame is repeated [`REPEAT`](Self::REPEAT)
/// times. Pulse widths come from [`Gpio::delay_us`] and inherit its timing
/// accuracy; receivers tolerate some jitter but nothing here guarantees it.
pub struct TriStateSwitch<G: Gpio> {
    gpio: G,
    pin: u8,
    initialized: bool,
}

impl<G: Gpio> TriStateSwitch<G> {
    /// Full-frame retransmissions per switch.
    pub const REPEAT: usize = 10;
    /// Unit pulse in microseconds.
    pub const PULSE_LENGTH_US: u64 = 300;
    pub const MODE: PinNumbering = PinNumbering::Bcm;

    pub fn new(gpio: G, pin: u8) -> Self {
        Self {
            gpio,
            pin,
            initialized: false,
        }
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    // Run before every frame: the transmitter's pin setup is not assumed to persist.
    fn initialize(&mut self) -> Result<()> {
        self.gpio.set_mode(Self::MODE)?;
        self.gpio.configure_output(self.pin)?;
        self.initialized = true;
        Ok(())
    }

    fn send_pulses(&mut self, pulses: &[Level]) -> Result<()> {
        self.gpio.write(self.pin, Level::Low)?;
        for _ in 0..Self::REPEAT {
            for &level in pulses {
                self.gpio.write(self.pin, level)?;
                self.gpio.delay_us(Self::PULSE_LENGTH_US);
            }
        }
        Ok(())
    }
}

impl<G: Gpio> Rc433Service for TriStateSwitch<G> {
    fn name(&self) -> &'static str {
        "tri-state"
    }

    fn applicable(&self, device: &Device) -> bool {
        matches!(device, Device::System(_))
    }

    fn transmit(&mut self, device: &Device, state: SwitchState) -> Result<bool> {
        let Device::System(dev) = device else {
            return Err(Rc433Error::UnsupportedDevice {
                kind: device.kind().name(),
            });
        };
        self.initialize()?;
        let frame = build_frame(&dev.system_code, dev.device_code, state);
        tracing::debug!(
            device = dev.device_name.as_str(),
            letter = dev.device_code.flag(),
            %state,
            ?frame,
            "toggle device"
        );
        self.send_pulses(&frame_pulses(&frame))?;
        // One-way protocol: nothing to confirm against
        Ok(true)
    }
}

impl<G: Gpio> Drop for TriStateSwitch<G> {
    fn drop(&mut self) {
        if self.initialized {
            self.gpio.release_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodeDevice, DeviceState, StatefulDevice, SystemDevice};
    use rf_transport::{GpioEvent, MockGpio};

    type Switch = TriStateSwitch<MockGpio>;

    fn lamp() -> Device {
        SystemDevice::new("gf-lamp", "00001", "A").unwrap().into()
    }

    #[test]
    fn test_switch_on_sends_ten_frames() {
        let mut svc = Switch::new(MockGpio::new(), DEFAULT_PIN);
        let rec = svc.gpio().recorder();
        let device = lamp();
        let wrapped = StatefulDevice {
            device: &device,
            state: DeviceState::Unknown,
        };
        assert!(svc.switch(&wrapped, "ON").unwrap());

        let writes = rec.writes(DEFAULT_PIN);
        assert_eq!(writes.len(), 1 + Switch::REPEAT * 128);
        // guard interval, then the same 128 pulses back to back
        assert_eq!(writes[0], Level::Low);
        let first = &writes[1..129];
        for frame in writes[1..].chunks(128) {
            assert_eq!(frame, first);
        }
        let expected = frame_pulses(&build_frame(
            &"00001".parse().unwrap(),
            crate::types::DeviceLetter::A,
            SwitchState::On,
        ));
        assert_eq!(first, &expected[..]);
        assert_eq!(
            rec.total_delay_us(),
            (Switch::REPEAT * 128) as u64 * Switch::PULSE_LENGTH_US
        );
    }

    #[test]
    fn test_pin_initialized_before_every_frame() {
        let mut svc = Switch::new(MockGpio::new(), 4);
        let rec = svc.gpio().recorder();
        let device = lamp();
        svc.switch(&device, "on").unwrap();
        svc.switch(&device, "off").unwrap();
        assert_eq!(rec.count(GpioEvent::SetMode(PinNumbering::Bcm)), 2);
        assert_eq!(rec.count(GpioEvent::ConfigureOutput(4)), 2);
        let events = rec.events();
        assert_eq!(events[0], GpioEvent::SetMode(PinNumbering::Bcm));
        assert_eq!(events[1], GpioEvent::ConfigureOutput(4));
    }

    #[test]
    fn test_rejects_code_device() {
        let mut svc = Switch::new(MockGpio::new(), DEFAULT_PIN);
        let rec = svc.gpio().recorder();
        let plug: Device = CodeDevice::new("ff-plug", 1, 2).unwrap().into();
        assert!(!svc.applicable(&plug));
        assert!(matches!(
            svc.switch(&plug, "on"),
            Err(Rc433Error::UnsupportedDevice {
                kind: "CodeDevice"
            })
        ));
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_rejects_bad_state() {
        let mut svc = Switch::new(MockGpio::new(), DEFAULT_PIN);
        assert!(matches!(
            svc.switch(&lamp(), "dim"),
            Err(Rc433Error::Validation(_))
        ));
    }

    #[test]
    fn test_gpio_released_once_on_drop() {
        let rec = {
            let mut svc = Switch::new(MockGpio::new(), DEFAULT_PIN);
            let rec = svc.gpio().recorder();
            svc.switch(&lamp(), "on").unwrap();
            svc.switch(&lamp(), "off").unwrap();
            assert_eq!(rec.count(GpioEvent::ReleaseAll), 0);
            rec
        };
        assert_eq!(rec.count(GpioEvent::ReleaseAll), 1);

        let untouched = Switch::new(MockGpio::new(), DEFAULT_PIN);
        let rec = untouched.gpio().recorder();
        drop(untouched);
        assert_eq!(rec.count(GpioEvent::ReleaseAll), 0);
    }
}
