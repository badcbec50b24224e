//! Message-bus facing contract: topic layout, state requests and reports.
//!
//! Requests arrive on `rc433/<floor>/<device>[/<command>]` with an `on`/`off`
//! payload. Acknowledged switches are reported on
//! `rc433/<floor>/<device>/state`, meant to be published retained. The bus
//! client itself lives outside this crate.

use crate::factory::{EncoderKind, Rc433, Rc433Factory};
use crate::switch::TriStateSwitch;
use crate::types::SwitchState;
use crate::{DecimalCodeTransmitter, DeviceRegistry, MetricsHub, Rc433Error, Result};
use rf_transport::{Gpio, RfTransmitter};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

pub const TOPIC_ROOT: &str = "rc433";
const DEVICE_PREFIXES: [&str; 3] = ["gf", "ff", "sf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Floor {
    Ground,
    First,
    Second,
}

impl Floor {
    pub fn as_str(self) -> &'static str {
        match self {
            Floor::Ground => "groundfloor",
            Floor::First => "firstfloor",
            Floor::Second => "secondfloor",
        }
    }
}

impl FromStr for Floor {
    type Err = Rc433Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "groundfloor" => Ok(Floor::Ground),
            "firstfloor" => Ok(Floor::First),
            "secondfloor" => Ok(Floor::Second),
            other => Err(Rc433Error::validation(format!("unknown floor '{other}'"))),
        }
    }
}

/// A parsed request topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub floor: Floor,
    pub device: String,
    pub command: Option<String>,
}

impl Topic {
    /// Where the applied state of this device is reported.
    pub fn state_topic(&self) -> String {
        format!("{TOPIC_ROOT}/{}/{}/state", self.floor.as_str(), self.device)
    }
}

impl FromStr for Topic {
    type Err = Rc433Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let (root, floor, device, command) = match parts.as_slice() {
            [root, floor, device] => (*root, *floor, *device, None),
            [root, floor, device, command] => (*root, *floor, *device, Some(*command)),
            _ => {
                return Err(Rc433Error::validation(format!(
                    "topic '{s}' must look like {TOPIC_ROOT}/<floor>/<device>[/<command>]"
                )))
            }
        };
        if root != TOPIC_ROOT {
            return Err(Rc433Error::validation(format!(
                "topic '{s}' is outside '{TOPIC_ROOT}'"
            )));
        }
        let floor = floor.parse()?;
        let prefix_ok = device
            .get(..2)
            .is_some_and(|p| DEVICE_PREFIXES.contains(&p));
        if !prefix_ok {
            return Err(Rc433Error::validation(format!(
                "device '{device}' must start with one of gf, ff, sf"
            )));
        }
        Ok(Self {
            floor,
            device: device.to_string(),
            command: command.map(str::to_string),
        })
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TOPIC_ROOT}/{}/{}", self.floor.as_str(), self.device)?;
        if let Some(cmd) = &self.command {
            write!(f, "/{cmd}")?;
        }
        Ok(())
    }
}

/// Inbound request to set a device state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRequest {
    pub device: String,
    pub state: SwitchState,
}

impl StateRequest {
    pub fn new(device: impl Into<String>, state: &str) -> Result<Self> {
        Ok(Self {
            device: device.into(),
            state: state.parse()?,
        })
    }

    pub fn from_message(topic: &Topic, payload: &[u8]) -> Result<Self> {
        let state = std::str::from_utf8(payload)
            .map_err(|_| Rc433Error::validation("payload is not valid UTF-8"))?;
        Self::new(topic.device.clone(), state)
    }
}

/// Outcome of one request, ready for downstream publication
#[derive(Debug, Clone, Serialize)]
pub struct StateReport {
    pub device: String,
    pub state: SwitchState,
    pub acknowledged: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

/// A message the bus client should publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Registry and encoders wired together for one transmitter.
///
/// Every method takes `&mut self`; callers serving several threads must put the
/// bridge behind a single lock so only one frame is on the air at a time.
pub struct Rc433Bridge<G: Gpio, R: RfTransmitter> {
    registry: DeviceRegistry,
    rc: Rc433<G, R>,
    metrics: MetricsHub,
}

impl<G: Gpio, R: RfTransmitter> Rc433Bridge<G, R> {
    pub fn new(registry: DeviceRegistry, rc: Rc433<G, R>, metrics: MetricsHub) -> Self {
        metrics.rc.devices_loaded.set(registry.len() as i64);
        Self {
            registry,
            rc,
            metrics,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn rc(&self) -> &Rc433<G, R> {
        &self.rc
    }

    pub fn metrics(&self) -> &MetricsHub {
        &self.metrics
    }

    /// Resolve, switch, and remember the state when the transmission was acknowledged.
    pub fn apply(&mut self, request: &StateRequest) -> Result<StateReport> {
        let target = self.registry.lookup(&request.device)?;
        let kind = Rc433Factory::service(&target);
        let acknowledged = self.rc.switch(&target, request.state.as_str())?;

        match kind {
            EncoderKind::TriState => self
                .metrics
                .rc
                .frames_sent
                .inc_by(TriStateSwitch::<G>::REPEAT as u64),
            EncoderKind::DecimalCode => self
                .metrics
                .rc
                .codes_sent
                .inc_by(DecimalCodeTransmitter::<R>::ATTEMPTS as u64),
        }
        if acknowledged {
            self.registry.record_state(&request.device, request.state)?;
            self.metrics.rc.switches_acked.inc();
        } else {
            self.metrics.rc.switches_unacked.inc();
        }
        Ok(StateReport {
            device: request.device.clone(),
            state: request.state,
            acknowledged,
            at: OffsetDateTime::now_utc(),
        })
    }

    /// Handle one raw bus message; the publication is present only when acknowledged.
    pub fn handle(
        &mut self,
        topic: &str,
        payload: &[u8],
    ) -> Result<(StateReport, Option<Publication>)> {
        let topic: Topic = topic.parse()?;
        let request = StateRequest::from_message(&topic, payload)?;
        tracing::info!(%topic, state = %request.state, "state request received");
        let report = self.apply(&request)?;
        let publication = report.acknowledged.then(|| Publication {
            topic: topic.state_topic(),
            payload: report.state.as_str().to_string(),
            retain: true,
        });
        Ok((report, publication))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceState;
    use rf_transport::{MockGpio, MockTransmitter};
    use serde_json::json;

    fn bridge(tx: MockTransmitter) -> Rc433Bridge<MockGpio, MockTransmitter> {
        let registry = DeviceRegistry::load(&[
            json!({"device_name": "gf-lamp", "system_code": "00001", "device_code": "A"}),
            json!({"device_name": "ff-plug", "code_on": 4793, "code_off": 4796}),
        ])
        .unwrap();
        Rc433Bridge::new(
            registry,
            Rc433::new(MockGpio::new(), tx, 17),
            MetricsHub::new().unwrap(),
        )
    }

    #[test]
    fn test_topic_parse() {
        let t: Topic = "rc433/groundfloor/gf-lamp/switch".parse().unwrap();
        assert_eq!(t.floor, Floor::Ground);
        assert_eq!(t.device, "gf-lamp");
        assert_eq!(t.command.as_deref(), Some("switch"));
        assert_eq!(t.to_string(), "rc433/groundfloor/gf-lamp/switch");
        assert_eq!(t.state_topic(), "rc433/groundfloor/gf-lamp/state");

        for bad in [
            "rc433/groundfloor",
            "other/groundfloor/gf-lamp",
            "rc433/basement/gf-lamp",
            "rc433/firstfloor/xx-lamp",
            "rc433/firstfloor/f",
            "rc433/a/b/c/d",
        ] {
            assert!(bad.parse::<Topic>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_system_device_end_to_end() {
        let mut b = bridge(MockTransmitter::new());
        let gpio = b.rc().tri_state().gpio().recorder();
        let (report, publication) = b
            .handle("rc433/groundfloor/gf-lamp", b"ON")
            .unwrap();
        assert!(report.acknowledged);
        assert_eq!(report.state, SwitchState::On);
        assert_eq!(gpio.writes(17).len(), 1 + 10 * 128);
        assert_eq!(
            publication,
            Some(Publication {
                topic: "rc433/groundfloor/gf-lamp/state".to_string(),
                payload: "on".to_string(),
                retain: true,
            })
        );
        assert_eq!(b.registry().lookup("gf-lamp").unwrap().state, DeviceState::On);
        assert_eq!(b.metrics().rc.frames_sent.get(), 10);
    }

    #[test]
    fn test_code_device_end_to_end() {
        let tx = MockTransmitter::with_acks([false, false, true, false, false], false);
        let rec = tx.recorder();
        let mut b = bridge(tx);
        let report = b.apply(&StateRequest::new("ff-plug", "off").unwrap()).unwrap();
        assert!(report.acknowledged);
        assert_eq!(rec.sent_codes(), vec![4796; 5]);
        assert_eq!(b.registry().lookup("ff-plug").unwrap().state, DeviceState::Off);
        assert_eq!(b.metrics().rc.codes_sent.get(), 5);
    }

    #[test]
    fn test_unacknowledged_switch_keeps_state() {
        let mut b = bridge(MockTransmitter::with_acks([], false));
        let (report, publication) = b.handle("rc433/firstfloor/ff-plug", b"on").unwrap();
        assert!(!report.acknowledged);
        assert!(publication.is_none());
        assert_eq!(
            b.registry().lookup("ff-plug").unwrap().state,
            DeviceState::Unknown
        );
        assert_eq!(b.metrics().rc.switches_unacked.get(), 1);
    }

    #[test]
    fn test_errors_surface() {
        let mut b = bridge(MockTransmitter::new());
        assert!(matches!(
            b.handle("rc433/firstfloor/ff-unknown", b"on"),
            Err(Rc433Error::DeviceNotFound(_))
        ));
        assert!(matches!(
            b.handle("rc433/firstfloor/ff-plug", b"toggle"),
            Err(Rc433Error::Validation(_))
        ));
        assert!(b.handle("rc433/firstfloor/ff-plug", &[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let report = StateReport {
            device: "gf-lamp".to_string(),
            state: SwitchState::Off,
            acknowledged: true,
            at: OffsetDateTime::UNIX_EPOCH,
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["state"], "off");
        assert_eq!(v["at"], "1970-01-01T00:00:00Z");
    }
}
