// Licensed under the Apache-2.0 license

//! Transport error types

use crate::Mode;
use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Channel failures. None of these are retried at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Channel missing or held exclusively elsewhere
    #[error("channel unavailable: {reason}")]
    Unavailable {
        reason: &'static str,
        errno: Option<i32>,
    },

    /// Accelerator refused a mode switch
    #[error("control request for mode {mode:?} rejected")]
    ControlRejected { mode: Mode, errno: Option<i32> },

    /// Mode register could not be read back
    #[error("mode query failed")]
    QueryFailed { errno: Option<i32> },

    /// Mode register holds a value outside the known set
    #[error("accelerator reported unknown mode {0}")]
    UnknownMode(u8),

    /// Fewer bytes accepted than offered
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite {
        written: usize,
        expected: usize,
        errno: Option<i32>,
    },

    /// Fewer bytes returned than one block
    #[error("short read: {read} of {expected} bytes")]
    ShortRead {
        read: usize,
        expected: usize,
        errno: Option<i32>,
    },

    /// Channel release failed
    #[error("failed to close channel")]
    CloseFailed { errno: Option<i32> },
}

impl TransportError {
    /// OS error number behind this failure, if any
    pub fn errno(&self) -> Option<i32> {
        match self {
            TransportError::Unavailable { errno, .. }
            | TransportError::ControlRejected { errno, .. }
            | TransportError::QueryFailed { errno }
            | TransportError::ShortWrite { errno, .. }
            | TransportError::ShortRead { errno, .. }
            | TransportError::CloseFailed { errno } => *errno,
            TransportError::UnknownMode(_) => None,
        }
    }
}
