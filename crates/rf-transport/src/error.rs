use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("pin not available: {0}")]
    PinUnavailable(u8),
    #[error("operation not supported on this backend: {0}")]
    Unsupported(&'static str),
    #[error("pin {0} is not configured as output")]
    NotConfigured(u8),
    #[error("unknown rf protocol: {0}")]
    UnknownProtocol(u8),
    #[error("I/O error: {0}")]
    Io(String),
}
