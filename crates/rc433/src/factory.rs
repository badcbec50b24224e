use crate::code::DecimalCodeTransmitter;
use crate::switch::TriStateSwitch;
use crate::types::{Device, DeviceKind, ResolveDevice};
use crate::{Rc433Service, Result};
use rf_transport::{Gpio, PulseTransmitter, RfProtocol, RfTransmitter, SharedGpio};

/// Encoder families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderKind {
    TriState,
    DecimalCode,
}

/// Picks the encoder responsible for a device.
pub struct Rc433Factory;

impl Rc433Factory {
    pub fn service(target: &dyn ResolveDevice) -> EncoderKind {
        Self::for_kind(target.resolve().kind())
    }

    // New device families get their encoder here
    pub fn for_kind(kind: DeviceKind) -> EncoderKind {
        match kind {
            DeviceKind::System => EncoderKind::TriState,
            DeviceKind::Code => EncoderKind::DecimalCode,
        }
    }
}

/// Owns one encoder per family and routes each switch through [`Rc433Factory`].
///
/// When both families share a data pin, build it with
/// [`Rc433::with_shared_gpio`] so the pin is claimed once for both encoders.
pub struct Rc433<G: Gpio, R: RfTransmitter> {
    tri_state: TriStateSwitch<G>,
    code: DecimalCodeTransmitter<R>,
}

impl<G: Gpio, R: RfTransmitter> Rc433<G, R> {
    pub fn new(gpio: G, rf: R, pin: u8) -> Self {
        Self {
            tri_state: TriStateSwitch::new(gpio, pin),
            code: DecimalCodeTransmitter::new(rf),
        }
    }

    pub fn service_mut(&mut self, kind: EncoderKind) -> &mut dyn Rc433Service {
        match kind {
            EncoderKind::TriState => &mut self.tri_state,
            EncoderKind::DecimalCode => &mut self.code,
        }
    }

    pub fn tri_state(&self) -> &TriStateSwitch<G> {
        &self.tri_state
    }

    pub fn code(&self) -> &DecimalCodeTransmitter<R> {
        &self.code
    }

    /// Switch any known device; see [`Rc433Service::switch`].
    pub fn switch(&mut self, target: &dyn ResolveDevice, state: &str) -> Result<bool> {
        let kind = Rc433Factory::service(target);
        self.service_mut(kind).switch(target, state)
    }

    pub fn applicable(&self, device: &Device) -> bool {
        match Rc433Factory::service(device) {
            EncoderKind::TriState => self.tri_state.applicable(device),
            EncoderKind::DecimalCode => self.code.applicable(device),
        }
    }
}

/// Dispatcher whose encoders drive the same pin through one [`SharedGpio`].
pub type SharedRc433<G> = Rc433<SharedGpio<G>, PulseTransmitter<SharedGpio<G>>>;

impl<G: Gpio> SharedRc433<G> {
    pub fn with_shared_gpio(gpio: G, pin: u8, protocol: RfProtocol) -> Self {
        let gpio = SharedGpio::new(gpio);
        let rf = PulseTransmitter::new(gpio.clone(), pin).with_protocol(protocol);
        Self::new(gpio, rf, pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodeDevice, DeviceState, StatefulDevice, SystemDevice};
    use crate::Rc433Error;
    use rf_transport::{BackendInfo, Level, MockGpio, MockTransmitter, PinNumbering, TransportError};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_factory_dispatch() {
        let lamp: Device = SystemDevice::new("test", "00001", "A").unwrap().into();
        let plug: Device = CodeDevice::new("test", 1, 2).unwrap().into();
        assert_eq!(Rc433Factory::service(&lamp), EncoderKind::TriState);
        assert_eq!(Rc433Factory::service(&plug), EncoderKind::DecimalCode);
    }

    #[test]
    fn test_factory_stateful_device() {
        let plug: Device = CodeDevice::new("test", 1, 2).unwrap().into();
        let wrapped = StatefulDevice {
            device: &plug,
            state: DeviceState::Off,
        };
        assert_eq!(Rc433Factory::service(&wrapped), EncoderKind::DecimalCode);
    }

    #[test]
    fn test_dispatcher_routes_to_matching_encoder() {
        let mut rc = Rc433::new(MockGpio::new(), MockTransmitter::new(), 17);
        let gpio = rc.tri_state().gpio().recorder();
        let tx = rc.code().transmitter().recorder();

        let lamp: Device = SystemDevice::new("gf-lamp", "00001", "A").unwrap().into();
        let plug: Device = CodeDevice::new("ff-plug", 4793, 4796).unwrap().into();
        assert!(rc.applicable(&lamp) && rc.applicable(&plug));

        assert!(rc.switch(&lamp, "on").unwrap());
        assert!(tx.events().is_empty());
        assert_eq!(gpio.writes(17).len(), 1281);

        gpio.clear();
        assert!(rc.switch(&plug, "off").unwrap());
        assert!(gpio.events().is_empty());
        assert_eq!(tx.sent_codes(), vec![4796; 5]);
    }

    /// GPIO whose pins are claimed per process, like rppal's.
    struct ClaimGpio {
        claims: Arc<Mutex<HashSet<u8>>>,
        mine: HashSet<u8>,
    }

    impl ClaimGpio {
        fn new(claims: &Arc<Mutex<HashSet<u8>>>) -> Self {
            Self {
                claims: Arc::clone(claims),
                mine: HashSet::new(),
            }
        }
    }

    impl Gpio for ClaimGpio {
        fn info(&self) -> BackendInfo {
            BackendInfo {
                name: "claim".to_string(),
                driver: "test".to_string(),
            }
        }

        fn set_mode(&mut self, _mode: PinNumbering) -> rf_transport::Result<()> {
            Ok(())
        }

        fn configure_output(&mut self, pin: u8) -> rf_transport::Result<()> {
            if self.mine.contains(&pin) {
                return Ok(());
            }
            if !self.claims.lock().unwrap().insert(pin) {
                return Err(TransportError::PinUnavailable(pin));
            }
            self.mine.insert(pin);
            Ok(())
        }

        fn write(&mut self, pin: u8, _level: Level) -> rf_transport::Result<()> {
            if self.mine.contains(&pin) {
                Ok(())
            } else {
                Err(TransportError::NotConfigured(pin))
            }
        }

        fn delay_us(&mut self, _us: u64) {}

        fn release_all(&mut self) {
            let mut claims = self.claims.lock().unwrap();
            for pin in self.mine.drain() {
                claims.remove(&pin);
            }
        }
    }

    #[test]
    fn test_mixed_families_share_one_pin() {
        let claims = Arc::new(Mutex::new(HashSet::new()));
        let lamp: Device = SystemDevice::new("gf-lamp", "00001", "A").unwrap().into();
        let plug: Device = CodeDevice::new("ff-plug", 4793, 4796).unwrap().into();
        {
            let mut rc =
                Rc433::with_shared_gpio(ClaimGpio::new(&claims), 17, RfProtocol::default());
            assert!(rc.switch(&lamp, "on").unwrap());
            assert!(rc.switch(&plug, "off").unwrap());
            assert!(rc.switch(&lamp, "off").unwrap());
            assert!(rc.switch(&plug, "on").unwrap());
            assert!(claims.lock().unwrap().contains(&17));
        }
        assert!(claims.lock().unwrap().is_empty());
    }

    #[test]
    fn test_separate_handles_collide_on_one_pin() {
        let claims = Arc::new(Mutex::new(HashSet::new()));
        let rf = PulseTransmitter::new(ClaimGpio::new(&claims), 17);
        let mut rc = Rc433::new(ClaimGpio::new(&claims), rf, 17);
        let lamp: Device = SystemDevice::new("gf-lamp", "00001", "A").unwrap().into();
        let plug: Device = CodeDevice::new("ff-plug", 4793, 4796).unwrap().into();
        assert!(rc.switch(&lamp, "on").unwrap());
        assert!(matches!(
            rc.switch(&plug, "off"),
            Err(Rc433Error::Transport(TransportError::PinUnavailable(17)))
        ));
    }

    #[test]
    fn test_wrong_encoder_is_unsupported() {
        let mut rc = Rc433::new(MockGpio::new(), MockTransmitter::new(), 17);
        let plug: Device = CodeDevice::new("ff-plug", 4793, 4796).unwrap().into();
        let err = rc
            .service_mut(EncoderKind::TriState)
            .switch(&plug, "on")
            .unwrap_err();
        assert!(matches!(err, Rc433Error::UnsupportedDevice { .. }));
        assert_eq!(err.to_string(), "the device type 'CodeDevice' is not supported");
    }
}
