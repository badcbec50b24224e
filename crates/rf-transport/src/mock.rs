use crate::{BackendInfo, Gpio, Level, PinNumbering, Result, RfTransmitter, TransportError};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call observed by [`MockGpio`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GpioEvent {
    SetMode(PinNumbering),
    ConfigureOutput(u8),
    Write(u8, Level),
    Delay(u64),
    ReleaseAll,
}

/// Shared view of everything a mock backend did, usable after the backend is dropped.
#[derive(Clone, Debug)]
pub struct Recorder<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> Recorder<E> {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<E>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: E) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<E> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Recorder<GpioEvent> {
    /// Levels written to `pin`, in order.
    pub fn writes(&self, pin: u8) -> Vec<Level> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                GpioEvent::Write(p, level) if *p == pin => Some(*level),
                _ => None,
            })
            .collect()
    }

    /// Sum of all simulated delays in microseconds.
    pub fn total_delay_us(&self) -> u64 {
        self.lock()
            .iter()
            .map(|e| match e {
                GpioEvent::Delay(us) => *us,
                _ => 0,
            })
            .sum()
    }

    pub fn count(&self, event: GpioEvent) -> usize {
        self.lock().iter().filter(|e| **e == event).count()
    }
}

/// In-process GPIO that records calls and never sleeps. Each instance is independent.
pub struct MockGpio {
    mode: Option<PinNumbering>,
    outputs: BTreeSet<u8>,
    recorder: Recorder<GpioEvent>,
}

impl MockGpio {
    pub fn new() -> Self {
        Self {
            mode: None,
            outputs: BTreeSet::new(),
            recorder: Recorder::new(),
        }
    }

    pub fn recorder(&self) -> Recorder<GpioEvent> {
        self.recorder.clone()
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpio for MockGpio {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "mock-gpio".to_string(),
            driver: "mock".to_string(),
        }
    }

    fn set_mode(&mut self, mode: PinNumbering) -> Result<()> {
        self.mode = Some(mode);
        self.recorder.push(GpioEvent::SetMode(mode));
        Ok(())
    }

    fn configure_output(&mut self, pin: u8) -> Result<()> {
        if self.mode.is_none() {
            return Err(TransportError::Unsupported("pin numbering not selected"));
        }
        self.outputs.insert(pin);
        self.recorder.push(GpioEvent::ConfigureOutput(pin));
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<()> {
        if !self.outputs.contains(&pin) {
            return Err(TransportError::NotConfigured(pin));
        }
        self.recorder.push(GpioEvent::Write(pin, level));
        Ok(())
    }

    fn delay_us(&mut self, us: u64) {
        self.recorder.push(GpioEvent::Delay(us));
    }

    fn release_all(&mut self) {
        self.mode = None;
        self.outputs.clear();
        self.recorder.push(GpioEvent::ReleaseAll);
    }
}

/// One call observed by [`MockTransmitter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxEvent {
    Enable,
    Send { code: u64, acked: bool },
    Release,
}

impl Recorder<TxEvent> {
    /// Codes passed to `send_code`, in order.
    pub fn sent_codes(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TxEvent::Send { code, .. } => Some(*code),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: TxEvent) -> usize {
        self.lock().iter().filter(|e| **e == event).count()
    }
}

/// Scripted transmitter: acknowledgments are popped from a queue, then `default_ack` applies.
pub struct MockTransmitter {
    enabled: bool,
    acks: VecDeque<bool>,
    default_ack: bool,
    recorder: Recorder<TxEvent>,
}

impl MockTransmitter {
    /// A transmitter that acknowledges every code.
    pub fn new() -> Self {
        Self::with_acks([], true)
    }

    pub fn with_acks(acks: impl IntoIterator<Item = bool>, default_ack: bool) -> Self {
        Self {
            enabled: false,
            acks: acks.into_iter().collect(),
            default_ack,
            recorder: Recorder::new(),
        }
    }

    pub fn recorder(&self) -> Recorder<TxEvent> {
        self.recorder.clone()
    }
}

impl Default for MockTransmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl RfTransmitter for MockTransmitter {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "mock-rf".to_string(),
            driver: "mock".to_string(),
        }
    }

    fn enable_transmit(&mut self) -> Result<()> {
        self.enabled = true;
        self.recorder.push(TxEvent::Enable);
        Ok(())
    }

    fn send_code(&mut self, code: u64) -> bool {
        // Like real drivers, nothing goes out before transmit mode is on
        let acked = self.enabled && self.acks.pop_front().unwrap_or(self.default_ack);
        self.recorder.push(TxEvent::Send { code, acked });
        acked
    }

    fn release(&mut self) {
        if self.enabled {
            self.enabled = false;
            self.recorder.push(TxEvent::Release);
        }
    }
}
