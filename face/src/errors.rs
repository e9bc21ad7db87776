use libndn::{Name, WireError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("The transport is closed.")]
    Closed,
    #[error("I/O error. {0}")]
    Io(#[from] std::io::Error),
    #[error("Registration of prefix {prefix} was refused. {reason}")]
    RegistrationRefused { prefix: Name, reason: String },
}

#[derive(Error, Debug)]
pub enum FaceError {
    #[error("The event loop is no longer running.")]
    LoopClosed,
    #[error("The encoding is {size} bytes, which exceeds the maximum NDN packet size of {max}.")]
    PacketTooLarge { size: usize, max: usize },
    #[error("Transport error. {0}")]
    Transport(#[from] TransportError),
    #[error("Wire format error. {0}")]
    Wire(#[from] WireError),
}

impl From<futures::channel::oneshot::Canceled> for FaceError {
    fn from(_: futures::channel::oneshot::Canceled) -> Self {
        FaceError::LoopClosed
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    InvalidConfig(#[from] serde_yml::Error),
}
