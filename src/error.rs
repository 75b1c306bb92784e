//! Error taxonomy for ledger and simulator operations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not connected: {0}")]
    NotConnected(String),

    #[error("unknown position id={0}")]
    UnknownPosition(u64),
}

impl SimError {
    /// Outcomes that callers log and otherwise ignore.
    pub fn is_noop(&self) -> bool {
        matches!(self, SimError::UnknownPosition(_) | SimError::NotConnected(_))
    }
}

pub type SimResult<T> = Result<T, SimError>;
