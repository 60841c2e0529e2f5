// Licensed under the Apache-2.0 license

//! PKCS#7 padding arithmetic
//!
//! Encryption always appends between 1 and 16 pad bytes, each holding the pad
//! count. Block-aligned input therefore gains a whole block of `0x10`.

use thiserror::Error;
use wsaes_transport::{Block, BLOCK_SIZE};

/// Errors from caller-side padding removal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaddingError {
    #[error("padded data length {0} is not a positive multiple of the block size")]
    Misaligned(usize),

    #[error("pad value {0:#04x} is outside 1..=16")]
    BadPadValue(u8),

    #[error("pad bytes do not all equal the pad count {0}")]
    Inconsistent(u8),
}

/// Number of pad bytes appended to `len` bytes of plaintext (1..=16)
pub fn pad_len(len: usize) -> usize {
    BLOCK_SIZE - len % BLOCK_SIZE
}

/// Ciphertext length produced for `len` bytes of plaintext
pub fn padded_len(len: usize) -> usize {
    len + pad_len(len)
}

/// Build the last block sent on encryption from the trailing partial block.
///
/// `tail` holds the `len % 16` bytes left after the last complete block and
/// may be empty, in which case the block is pure padding.
pub fn final_block(tail: &[u8]) -> Block {
    debug_assert!(tail.len() < BLOCK_SIZE);
    let pad = pad_len(tail.len()) as u8;
    let mut block = [pad; BLOCK_SIZE];
    block[..tail.len()].copy_from_slice(tail);
    block
}

/// Remove and validate PKCS#7 padding from decrypted data.
///
/// The cipher session never does this itself; callers that know they hold a
/// whole message run it over the decrypted output.
pub fn strip_padding(data: &[u8]) -> Result<&[u8], PaddingError> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(PaddingError::Misaligned(data.len()));
    }

    let pad = data[data.len() - 1];
    if pad == 0 || pad as usize > BLOCK_SIZE {
        return Err(PaddingError::BadPadValue(pad));
    }

    let (body, padding) = data.split_at(data.len() - pad as usize);
    if padding.iter().any(|b| *b != pad) {
        return Err(PaddingError::Inconsistent(pad));
    }

    Ok(body)
}
