use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Invalid percent escape in name component '{0}'")]
    InvalidEscape(String),
    #[error("Unsupported URI scheme in '{0}'. Only 'ndn:' is accepted.")]
    UnsupportedScheme(String),
}

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Could not encode packet. {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Could not decode element. {0}")]
    Decode(#[source] serde_json::Error),
}

/// An error handed back by an application callback.
///
/// Callbacks run on the loop thread. Their failures are returned as values so that the dispatcher can log them and
/// carry on with the other outstanding requests.
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CallbackError {
    pub fn msg(msg: impl Display) -> Self {
        CallbackError::Message(msg.to_string())
    }
}

pub type CallbackResult = Result<(), CallbackError>;

/// What happened when a dispatcher invoked an optional application callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// There was no callback to invoke.
    Skipped,
    Completed,
    /// The callback returned an error. It has already been logged.
    Failed,
}

impl CallbackOutcome {
    /// Inspect the result of a callback invocation, logging any failure against `context`.
    pub fn inspect(result: CallbackResult, context: &str) -> Self {
        match result {
            Ok(()) => CallbackOutcome::Completed,
            Err(e) => {
                log::warn!("Error in {context}: {e}");
                CallbackOutcome::Failed
            }
        }
    }
}
