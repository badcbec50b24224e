use crate::types::{
    AttrValue, CodeDevice, Device, DeviceKind, DeviceState, StatefulDevice, SwitchState,
    SystemDevice,
};
use crate::{Rc433Error, Result};
use anyhow::Context;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Devices loaded once from configuration plus their last applied state.
#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
    states: HashMap<String, SwitchState>,
}

impl DeviceRegistry {
    /// Build a registry from raw records; any bad record fails the whole load.
    pub fn load(records: &[Value]) -> Result<Self> {
        let devices = records
            .iter()
            .enumerate()
            .map(|(i, r)| device_from_record(i, r))
            .collect::<Result<Vec<_>>>()?;
        Self::from_devices(devices)
    }

    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> Result<Self> {
        let mut reg = Self::default();
        for (i, dev) in devices.into_iter().enumerate() {
            reg.insert(i, dev)?;
        }
        tracing::debug!(devices = reg.devices.len(), "device registry loaded");
        Ok(reg)
    }

    // `index` is the record position reported if the name is already taken
    fn insert(&mut self, index: usize, dev: Device) -> Result<()> {
        if self.index.contains_key(dev.name()) {
            return Err(Rc433Error::Config {
                record: record_label(index, Some(dev.name())),
                source: Box::new(Rc433Error::validation(format!(
                    "duplicate device_name '{}'",
                    dev.name()
                ))),
            });
        }
        self.index.insert(dev.name().to_string(), self.devices.len());
        self.devices.push(dev);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<StatefulDevice<'_>> {
        let idx = self
            .index
            .get(name)
            .ok_or_else(|| Rc433Error::DeviceNotFound(name.to_string()))?;
        Ok(self.wrap(&self.devices[*idx]))
    }

    /// Snapshot of every device in configuration order.
    pub fn list(&self) -> Vec<StatefulDevice<'_>> {
        self.devices.iter().map(|d| self.wrap(d)).collect()
    }

    /// Remember `state` for `name` after a confirmed transmission.
    pub fn record_state(&mut self, name: &str, state: SwitchState) -> Result<()> {
        if !self.index.contains_key(name) {
            return Err(Rc433Error::DeviceNotFound(name.to_string()));
        }
        self.states.insert(name.to_string(), state);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(Device::name)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn wrap<'a>(&'a self, device: &'a Device) -> StatefulDevice<'a> {
        StatefulDevice {
            device,
            state: self
                .states
                .get(device.name())
                .copied()
                .map(DeviceState::from)
                .unwrap_or_default(),
        }
    }
}

/// Construct one device from a raw record. The variant is picked by which fields are present.
pub fn device_from_record(index: usize, record: &Value) -> Result<Device> {
    let name = record.get("device_name").and_then(Value::as_str);
    build_device(record).map_err(|e| Rc433Error::Config {
        record: record_label(index, name),
        source: Box::new(e),
    })
}

fn build_device(record: &Value) -> Result<Device> {
    let map = record
        .as_object()
        .ok_or_else(|| Rc433Error::validation("device record must be a mapping"))?;
    let kind = detect_kind(map)?;
    let mut attrs = HashMap::new();
    for (field, ty) in kind.props() {
        let raw = map
            .get(*field)
            .ok_or_else(|| Rc433Error::validation(format!("missing field '{field}'")))?;
        attrs.insert(*field, ty.coerce(field, raw)?);
    }
    match kind {
        DeviceKind::System => {
            let name = take_text(&mut attrs, "device_name");
            let mut system_code = take_text(&mut attrs, "system_code");
            // Numeric codes such as `11` or JSON `1010` lose their leading zeros
            if map.get("system_code").is_some_and(Value::is_number) {
                system_code = format!("{system_code:0>5}");
            }
            let device_code = take_text(&mut attrs, "device_code");
            Ok(SystemDevice::new(name, &system_code, &device_code)?.into())
        }
        DeviceKind::Code => {
            let name = take_text(&mut attrs, "device_name");
            let code_on = integer(&attrs, "code_on");
            let code_off = integer(&attrs, "code_off");
            Ok(CodeDevice::new(name, code_on, code_off)?.into())
        }
    }
}

fn take_text(attrs: &mut HashMap<&str, AttrValue>, field: &str) -> String {
    attrs
        .remove(field)
        .and_then(AttrValue::into_text)
        .unwrap_or_default()
}

fn integer(attrs: &HashMap<&str, AttrValue>, field: &str) -> u64 {
    attrs
        .get(field)
        .and_then(AttrValue::as_integer)
        .unwrap_or_default()
}

fn detect_kind(map: &Map<String, Value>) -> Result<DeviceKind> {
    let has = |f: &str| map.contains_key(f);
    if has("system_code") || has("device_code") {
        Ok(DeviceKind::System)
    } else if has("code_on") || has("code_off") {
        Ok(DeviceKind::Code)
    } else {
        Err(Rc433Error::validation(
            "cannot tell device type: expected system_code/device_code or code_on/code_off",
        ))
    }
}

fn record_label(index: usize, name: Option<&str>) -> String {
    match name {
        Some(n) => format!("#{index} ({n})"),
        None => format!("#{index}"),
    }
}

/// Read the raw records of one YAML or JSON file: a list, or a mapping with a `devices` list.
pub fn read_device_records(path: impl AsRef<Path>) -> anyhow::Result<Vec<Value>> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading devices: {}", path.display()))?;
    let val: Value =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing yaml: {}", path.display()))?;
    match val {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("devices") {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("{}: expected a `devices` list", path.display()),
        },
        Value::Null => Ok(Vec::new()),
        _ => anyhow::bail!("{}: expected a list of devices", path.display()),
    }
}

pub fn load_devices_file(path: impl AsRef<Path>) -> anyhow::Result<DeviceRegistry> {
    let path = path.as_ref();
    let records = read_device_records(path)?;
    let reg = DeviceRegistry::load(&records)
        .with_context(|| format!("loading devices: {}", path.display()))?;
    Ok(reg)
}

pub fn load_devices_dir(dir: impl AsRef<Path>) -> anyhow::Result<DeviceRegistry> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        let path = entry.path();
        if let Some(ext) = path.extension() {
            if ext == "yml" || ext == "yaml" || ext == "json" {
                entries.push(path);
            }
        }
    }
    entries.sort();
    let mut reg = DeviceRegistry::default();
    for p in entries {
        let records = read_device_records(&p)?;
        for (i, r) in records.iter().enumerate() {
            device_from_record(i, r)
                .and_then(|dev| reg.insert(i, dev))
                .with_context(|| format!("loading devices: {}", p.display()))?;
        }
    }
    tracing::debug!(devices = reg.len(), dir = %dir.as_ref().display(), "device registry loaded");
    Ok(reg)
}

/// Load a single file or every descriptor in a directory.
pub fn load_devices(path: impl AsRef<Path>) -> anyhow::Result<DeviceRegistry> {
    let path = path.as_ref();
    if path.is_dir() {
        load_devices_dir(path)
    } else {
        load_devices_file(path)
    }
}
