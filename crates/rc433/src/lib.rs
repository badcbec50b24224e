//! rc433: device registry and switch encoders for 433MHz power sockets
//!
//! Devices come in two families. DIP-switch sockets are addressed by a system
//! code and a device letter and driven by [`TriStateSwitch`]; learning sockets
//! take a fixed on/off code sent through [`DecimalCodeTransmitter`].
//! [`Rc433Factory`] picks the encoder for a device and [`Rc433Bridge`] ties the
//! registry to the encoders behind a message-bus style topic layout.

mod error;
pub use error::{Rc433Error, Result};

mod types;
pub use types::*;

mod loader;
pub use loader::{
    device_from_record, load_devices, load_devices_dir, load_devices_file, read_device_records,
    DeviceRegistry,
};

pub mod encode;

mod service;
pub use service::Rc433Service;

mod switch;
pub use switch::{TriStateSwitch, DEFAULT_PIN};

mod code;
pub use code::DecimalCodeTransmitter;

mod factory;
pub use factory::{EncoderKind, Rc433, Rc433Factory, SharedRc433};

mod metrics;
pub use metrics::{MetricsHub, SwitchMetrics};

mod bridge;
pub use bridge::{Floor, Publication, Rc433Bridge, StateReport, StateRequest, Topic, TOPIC_ROOT};
