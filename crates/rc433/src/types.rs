use crate::{Rc433Error, Result};
use rf_transport::MAX_CODE;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Concrete device families known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Code,
    System,
}

/// Expected type of a raw configuration attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Integer,
}

/// A raw attribute after coercion to its [`AttrType`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Integer(u64),
}

impl DeviceKind {
    pub fn name(self) -> &'static str {
        match self {
            DeviceKind::Code => "CodeDevice",
            DeviceKind::System => "SystemDevice",
        }
    }

    /// Attribute names and the types the loader coerces them to.
    pub fn props(self) -> &'static [(&'static str, AttrType)] {
        match self {
            DeviceKind::Code => &[
                ("device_name", AttrType::String),
                ("code_on", AttrType::Integer),
                ("code_off", AttrType::Integer),
            ],
            DeviceKind::System => &[
                ("device_name", AttrType::String),
                ("system_code", AttrType::String),
                ("device_code", AttrType::String),
            ],
        }
    }
}

impl AttrType {
    pub fn coerce(self, field: &str, value: &Value) -> Result<AttrValue> {
        match (self, value) {
            (AttrType::String, Value::String(s)) => Ok(AttrValue::Text(s.clone())),
            (AttrType::String, Value::Number(n)) => Ok(AttrValue::Text(n.to_string())),
            (AttrType::Integer, Value::Number(n)) => {
                n.as_u64().map(AttrValue::Integer).ok_or_else(|| {
                    Rc433Error::validation(format!("{field}: {n} is not a non-negative integer"))
                })
            }
            (AttrType::Integer, Value::String(s)) => {
                s.trim().parse::<u64>().map(AttrValue::Integer).map_err(|_| {
                    Rc433Error::validation(format!("{field}: '{s}' is not a non-negative integer"))
                })
            }
            (ty, other) => Err(Rc433Error::validation(format!(
                "{field}: expected {ty:?}, got {other}"
            ))),
        }
    }
}

impl AttrValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }
}

/// Positions of the five DIP switches on the reference remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemCode([bool; 5]);

impl SystemCode {
    pub fn switches(&self) -> [bool; 5] {
        self.0
    }
}

impl FromStr for SystemCode {
    type Err = Rc433Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut out = [false; 5];
        if s.chars().count() != out.len() {
            return Err(Rc433Error::validation(format!(
                "system_code '{s}' must be exactly 5 characters"
            )));
        }
        for (slot, c) in out.iter_mut().zip(s.chars()) {
            *slot = match c {
                '0' => false,
                '1' => true,
                other => {
                    return Err(Rc433Error::validation(format!(
                        "system_code '{s}' contains '{other}', expected '0' or '1'"
                    )))
                }
            };
        }
        Ok(Self(out))
    }
}

impl fmt::Display for SystemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for on in self.0 {
            f.write_str(if on { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl Serialize for SystemCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Button on the reference remote that addresses a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceLetter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl DeviceLetter {
    pub const ALL: [DeviceLetter; 7] = [
        DeviceLetter::A,
        DeviceLetter::B,
        DeviceLetter::C,
        DeviceLetter::D,
        DeviceLetter::E,
        DeviceLetter::F,
        DeviceLetter::G,
    ];

    /// One-hot flag of the button: A=1, B=2, ... G=64.
    pub fn flag(self) -> u8 {
        match self {
            DeviceLetter::A => 1,
            DeviceLetter::B => 2,
            DeviceLetter::C => 4,
            DeviceLetter::D => 8,
            DeviceLetter::E => 16,
            DeviceLetter::F => 32,
            DeviceLetter::G => 64,
        }
    }
}

impl FromStr for DeviceLetter {
    type Err = Rc433Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(DeviceLetter::A),
            "B" => Ok(DeviceLetter::B),
            "C" => Ok(DeviceLetter::C),
            "D" => Ok(DeviceLetter::D),
            "E" => Ok(DeviceLetter::E),
            "F" => Ok(DeviceLetter::F),
            "G" => Ok(DeviceLetter::G),
            other => Err(Rc433Error::validation(format!(
                "device_code '{other}' must be one of A, B, C, D, E, F, G"
            ))),
        }
    }
}

impl fmt::Display for DeviceLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Socket addressed by DIP switches and a button letter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemDevice {
    pub device_name: String,
    pub system_code: SystemCode,
    pub device_code: DeviceLetter,
}

impl SystemDevice {
    pub fn new(
        device_name: impl Into<String>,
        system_code: &str,
        device_code: &str,
    ) -> Result<Self> {
        Ok(Self {
            device_name: checked_name(device_name.into())?,
            system_code: system_code.parse()?,
            device_code: device_code.parse()?,
        })
    }
}

/// Receiver that has learned two fixed decimal codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeDevice {
    pub device_name: String,
    pub code_on: u64,
    pub code_off: u64,
}

impl CodeDevice {
    /// Codes go out as at most 32-bit words, so anything above [`MAX_CODE`] is rejected.
    pub fn new(device_name: impl Into<String>, code_on: u64, code_off: u64) -> Result<Self> {
        Ok(Self {
            device_name: checked_name(device_name.into())?,
            code_on: checked_code("code_on", code_on)?,
            code_off: checked_code("code_off", code_off)?,
        })
    }

    /// Build from textual codes, e.g. values read from a config file as strings.
    pub fn parse(device_name: impl Into<String>, code_on: &str, code_off: &str) -> Result<Self> {
        let coerce = |field: &str, raw: &str| {
            AttrType::Integer
                .coerce(field, &Value::String(raw.to_string()))
                .map(|v| v.as_integer().unwrap_or_default())
        };
        Self::new(
            device_name,
            coerce("code_on", code_on)?,
            coerce("code_off", code_off)?,
        )
    }
}

fn checked_code(field: &str, code: u64) -> Result<u64> {
    if code > MAX_CODE {
        return Err(Rc433Error::validation(format!(
            "{field}: {code} does not fit in 32 bits"
        )));
    }
    Ok(code)
}

fn checked_name(name: String) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Rc433Error::validation("device_name must not be empty"));
    }
    Ok(name)
}

/// A controllable device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Device {
    Code(CodeDevice),
    System(SystemDevice),
}

impl Device {
    pub fn name(&self) -> &str {
        match self {
            Device::Code(d) => &d.device_name,
            Device::System(d) => &d.device_name,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            Device::Code(_) => DeviceKind::Code,
            Device::System(_) => DeviceKind::System,
        }
    }
}

impl From<CodeDevice> for Device {
    fn from(d: CodeDevice) -> Self {
        Device::Code(d)
    }
}

impl From<SystemDevice> for Device {
    fn from(d: SystemDevice) -> Self {
        Device::System(d)
    }
}

/// Requested on/off state of a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn as_str(self) -> &'static str {
        match self {
            SwitchState::On => "on",
            SwitchState::Off => "off",
        }
    }
}

impl FromStr for SwitchState {
    type Err = Rc433Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "on" => Ok(SwitchState::On),
            "off" => Ok(SwitchState::Off),
            _ => Err(Rc433Error::validation(format!(
                "state '{s}' must be 'on' or 'off'"
            ))),
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last state applied to a device; `Unknown` until the first confirmed switch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    #[default]
    Unknown,
    On,
    Off,
}

impl From<SwitchState> for DeviceState {
    fn from(s: SwitchState) -> Self {
        match s {
            SwitchState::On => DeviceState::On,
            SwitchState::Off => DeviceState::Off,
        }
    }
}

/// A registry-owned device paired with its last known state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatefulDevice<'a> {
    pub device: &'a Device,
    pub state: DeviceState,
}

/// Anything that stands for exactly one [`Device`].
pub trait ResolveDevice {
    fn resolve(&self) -> &Device;
}

impl ResolveDevice for Device {
    fn resolve(&self) -> &Device {
        self
    }
}

impl ResolveDevice for StatefulDevice<'_> {
    fn resolve(&self) -> &Device {
        self.device
    }
}
