// Licensed under the Apache-2.0 license

//! Session error types

use crate::Direction;
use thiserror::Error;
use wsaes_transport::TransportError;

/// Session result type
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Cipher session error enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Input length outside the direction's contract; raised before any I/O
    #[error("invalid {direction} input length {len}")]
    InvalidLength { direction: Direction, len: usize },

    /// Caller's output capacity below the computed output length
    #[error("output buffer holds {capacity} bytes, {needed} required")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// Key or IV missing, or invalidated by a failed programming attempt
    #[error("key and IV must be programmed before {0}")]
    NotProgrammed(Direction),

    /// Channel failure during a protocol call
    #[error("transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    /// A holder of the accelerator lock panicked mid-call
    #[error("accelerator lock poisoned")]
    LockPoisoned,
}

impl ProtocolError {
    /// The underlying transport error, if this is a transport failure
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ProtocolError::TransportFailure(err) => Some(err),
            _ => None,
        }
    }
}
