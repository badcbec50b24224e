use rf_transport::TransportError;
use thiserror::Error;

pub type Result<T, E = Rc433Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Rc433Error {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("the device type '{kind}' is not supported")]
    UnsupportedDevice { kind: &'static str },
    #[error("invalid device record {record}: {source}")]
    Config {
        record: String,
        source: Box<Rc433Error>,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Rc433Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
