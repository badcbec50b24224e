use crate::types::{Device, ResolveDevice, SwitchState};
use crate::{Rc433Error, Result};

/// An encoder able to switch one family of devices.
pub trait Rc433Service {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this encoder speaks the protocol of `device`.
    fn applicable(&self, device: &Device) -> bool;

    /// Send `state` to an applicable device; returns the transmission acknowledgment.
    fn transmit(&mut self, device: &Device, state: SwitchState) -> Result<bool>;

    /// Validate the request, then transmit.
    ///
    /// Fails on an invalid state string or a device of the wrong family; an
    /// unacknowledged transmission is `Ok(false)`.
    fn switch(&mut self, target: &dyn ResolveDevice, state: &str) -> Result<bool> {
        let device = target.resolve();
        tracing::info!(
            device = device.name(),
            state,
            encoder = self.name(),
            "device switch requested"
        );
        let state: SwitchState = state.parse()?;
        if !self.applicable(device) {
            return Err(Rc433Error::UnsupportedDevice {
                kind: device.kind().name(),
            });
        }
        self.transmit(device, state)
    }
}
