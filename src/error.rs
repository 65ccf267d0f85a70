//! Crate-level error type for callers that cross module boundaries.

use std::fmt;

use crate::config::ConfigError;
use crate::ecg::EcgError;
use crate::protocol::ProtocolError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum PulseError {
    Store(StoreError),
    Protocol(ProtocolError),
    Ecg(EcgError),
    Config(ConfigError),
    Io(String),
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseError::Store(err) => write!(f, "{}", err),
            PulseError::Protocol(err) => write!(f, "{}", err),
            PulseError::Ecg(err) => write!(f, "{}", err),
            PulseError::Config(err) => write!(f, "{}", err),
            PulseError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PulseError {}

impl From<StoreError> for PulseError {
    fn from(error: StoreError) -> Self {
        PulseError::Store(error)
    }
}

impl From<ProtocolError> for PulseError {
    fn from(error: ProtocolError) -> Self {
        PulseError::Protocol(error)
    }
}

impl From<EcgError> for PulseError {
    fn from(error: EcgError) -> Self {
        PulseError::Ecg(error)
    }
}

impl From<ConfigError> for PulseError {
    fn from(error: ConfigError) -> Self {
        PulseError::Config(error)
    }
}

impl From<std::io::Error> for PulseError {
    fn from(error: std::io::Error) -> Self {
        PulseError::Io(error.to_string())
    }
}
