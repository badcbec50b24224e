//! rf-transport: GPIO and 433MHz transmitter abstractions
//!
//! This crate provides blocking traits for driving a radio transmitter from a
//! single-board computer, with feature-gated backends. The default build enables
//! a `mock` backend so that binaries and tests run on any host; the `gpio`
//! feature adds a Raspberry Pi backend.

mod types;
pub use types::{BackendInfo, Level, PinNumbering};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::{Gpio, RfTransmitter};

mod pulse;
pub use pulse::{PulseTransmitter, RfProtocol, DEFAULT_CODE_BITS, DEFAULT_REPEAT, MAX_CODE};

mod shared;
pub use shared::SharedGpio;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{GpioEvent, MockGpio, MockTransmitter, Recorder, TxEvent};

#[cfg(feature = "gpio")]
mod rpi;

#[cfg(feature = "gpio")]
pub use rpi::RpiGpio;
