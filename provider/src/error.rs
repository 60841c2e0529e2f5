// Licensed under the Apache-2.0 license

//! Provider error types

use thiserror::Error;
use wsaes_session::ProtocolError;

use crate::CipherAlgorithm;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("cipher {0:?} is not provided by this engine")]
    UnsupportedCipher(CipherAlgorithm),

    #[error("cipher context used before init")]
    NotInitialized,

    #[error("key must be {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("IV must be {expected} bytes, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
