// Licensed under the Apache-2.0 license

//! Cipher Session
//!
//! The AES-256-CBC protocol spoken over a [`DeviceChannel`]. Every call is a
//! complete open → mode select → transfer → close span:
//!
//! ```text
//!   set_key / set_iv:   open ─ SetKey|SetIv ─ payload ─ close
//!
//!   encrypt / decrypt:  open ─ Reset ─ Encrypt|Decrypt ─ block 0 … block N
//!                            [─ pad block, encrypt only] ─ close
//! ```
//!
//! Encryption appends PKCS#7 padding. Decryption returns the raw transformed
//! blocks and leaves padding removal to the caller (see [`strip_padding`]).

pub mod error;
pub mod exclusive;
pub mod padding;

use core::fmt;

use log::{debug, trace, warn};
use wsaes_transport::{
    Block, ChannelHandle, DeviceChannel, Mode, TransportResult, BLOCK_SIZE, IV_SIZE, KEY_SIZE,
    MAX_DATA_SIZE,
};
use zeroize::Zeroizing;

pub use error::{ProtocolError, ProtocolResult};
pub use exclusive::{Accelerator, AcceleratorGuard};
pub use padding::{final_block, pad_len, padded_len, strip_padding, PaddingError};

/// Largest ciphertext accepted for decryption: the plaintext ceiling plus one
/// block of padding
pub const MAX_FRAMED_SIZE: usize = MAX_DATA_SIZE + BLOCK_SIZE;

/// Cipher direction of a transform call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Accelerator mode selected for this direction
    pub fn mode(self) -> Mode {
        match self {
            Direction::Encrypt => Mode::Encrypt,
            Direction::Decrypt => Mode::Decrypt,
        }
    }
}

impl TryFrom<Mode> for Direction {
    type Error = Mode;

    fn try_from(mode: Mode) -> Result<Self, Mode> {
        match mode {
            Mode::Encrypt => Ok(Direction::Encrypt),
            Mode::Decrypt => Ok(Direction::Decrypt),
            other => Err(other),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => write!(f, "encrypt"),
            Direction::Decrypt => write!(f, "decrypt"),
        }
    }
}

/// Progress of the most recent encrypt/decrypt call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Reset,
    ModeSelected,
    /// Index of the block currently in flight
    Streaming(usize),
    Closed,
    Aborted,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    pub calls_succeeded: u64,
    pub calls_failed: u64,
    pub blocks_transferred: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Output length of a transform call, after validating the input length.
///
/// Encryption accepts 1..=256 bytes and always grows to the next block
/// boundary (a full extra block when already aligned). Decryption accepts a
/// positive multiple of 16 up to [`MAX_FRAMED_SIZE`] and keeps its length.
pub fn output_len(direction: Direction, len: usize) -> ProtocolResult<usize> {
    let valid = match direction {
        Direction::Encrypt => (1..=MAX_DATA_SIZE).contains(&len),
        Direction::Decrypt => len > 0 && len % BLOCK_SIZE == 0 && len <= MAX_FRAMED_SIZE,
    };
    if !valid {
        return Err(ProtocolError::InvalidLength { direction, len });
    }

    Ok(match direction {
        Direction::Encrypt => padded_len(len),
        Direction::Decrypt => len,
    })
}

/// Stateful client for the accelerator.
///
/// Holds at most one key/IV pair. Both must be programmed before any
/// transform; a failed programming attempt clears the affected slot.
pub struct CipherSession<C: DeviceChannel> {
    channel: C,
    key: Option<Zeroizing<[u8; KEY_SIZE]>>,
    iv: Option<Zeroizing<[u8; IV_SIZE]>>,
    state: CallState,
    stats: SessionStatistics,
}

impl<C: DeviceChannel> CipherSession<C> {
    /// Create a session over `channel`. Nothing is opened until the first call.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            key: None,
            iv: None,
            state: CallState::Idle,
            stats: SessionStatistics::default(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Progress marker of the most recent encrypt/decrypt call
    pub fn last_call_state(&self) -> CallState {
        self.state
    }

    pub fn stats(&self) -> &SessionStatistics {
        &self.stats
    }

    /// Check that the accelerator's channel is present
    pub fn init(&self) -> ProtocolResult<()> {
        self.channel.probe()?;
        Ok(())
    }

    /// Program the 32-byte key register
    pub fn set_key(&mut self, key: &[u8; KEY_SIZE]) -> ProtocolResult<()> {
        self.key = None;
        self.program_register(Mode::SetKey, key)?;
        self.key = Some(Zeroizing::new(*key));
        Ok(())
    }

    /// Program the 16-byte IV register
    pub fn set_iv(&mut self, iv: &[u8; IV_SIZE]) -> ProtocolResult<()> {
        self.iv = None;
        self.program_register(Mode::SetIv, iv)?;
        self.iv = Some(Zeroizing::new(*iv));
        Ok(())
    }

    pub fn is_programmed(&self) -> bool {
        self.key.is_some() && self.iv.is_some()
    }

    /// Whether the last successful programming left exactly this key and IV
    pub fn holds(&self, key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE]) -> bool {
        match (&self.key, &self.iv) {
            (Some(k), Some(v)) => k.as_slice() == key.as_slice() && v.as_slice() == iv.as_slice(),
            _ => false,
        }
    }

    /// Drop the remembered key and IV. The accelerator registers are untouched.
    pub fn forget(&mut self) {
        self.key = None;
        self.iv = None;
    }

    /// Encrypt `plaintext`, returning padded ciphertext
    pub fn encrypt(&mut self, plaintext: &[u8]) -> ProtocolResult<Vec<u8>> {
        self.transform_to_vec(Direction::Encrypt, plaintext)
    }

    /// Decrypt `ciphertext`. The result still carries its padding.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> ProtocolResult<Vec<u8>> {
        self.transform_to_vec(Direction::Decrypt, ciphertext)
    }

    fn transform_to_vec(&mut self, direction: Direction, input: &[u8]) -> ProtocolResult<Vec<u8>> {
        let mut output = vec![0u8; output_len(direction, input.len())?];
        let len = self.transform(direction, input, &mut output)?;
        output.truncate(len);
        Ok(output)
    }

    /// Run one full accelerator cycle, writing into `output`.
    ///
    /// `output.len()` is the capacity. Returns the number of bytes produced.
    /// The produced range is zeroed before any block moves, so on failure it
    /// holds only the blocks that completed a round trip, followed by zeros.
    pub fn transform(
        &mut self,
        direction: Direction,
        input: &[u8],
        output: &mut [u8],
    ) -> ProtocolResult<usize> {
        let out_len = output_len(direction, input.len())?;
        if output.len() < out_len {
            return Err(ProtocolError::BufferTooSmall {
                needed: out_len,
                capacity: output.len(),
            });
        }
        if !self.is_programmed() {
            return Err(ProtocolError::NotProgrammed(direction));
        }

        let output = &mut output[..out_len];
        output.fill(0);

        debug!(
            "{}: {} bytes in, {} bytes out",
            direction,
            input.len(),
            out_len
        );
        self.state = CallState::Idle;

        let result = match self.channel.open() {
            Ok(mut handle) => {
                let streamed = stream(&mut handle, &mut self.state, direction, input, output);
                release(handle, streamed)
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(blocks) => {
                self.state = CallState::Closed;
                self.stats.calls_succeeded += 1;
                self.stats.blocks_transferred += blocks as u64;
                self.stats.bytes_in += input.len() as u64;
                self.stats.bytes_out += out_len as u64;
                Ok(out_len)
            }
            Err(err) => {
                warn!("{} aborted in state {:?}: {}", direction, self.state, err);
                self.state = CallState::Aborted;
                self.stats.calls_failed += 1;
                Err(err.into())
            }
        }
    }

    fn program_register(&mut self, mode: Mode, payload: &[u8]) -> ProtocolResult<()> {
        debug!("programming {:?} ({} bytes)", mode, payload.len());
        let mut handle = self.channel.open()?;
        let written = handle
            .select_mode(mode)
            .and_then(|_| handle.write_payload(payload));
        release(handle, written)?;
        Ok(())
    }
}

/// Reset, select the direction's mode and move every block through the
/// accelerator. Returns the number of blocks transferred.
fn stream<H: ChannelHandle>(
    handle: &mut H,
    state: &mut CallState,
    direction: Direction,
    input: &[u8],
    output: &mut [u8],
) -> TransportResult<usize> {
    handle.select_mode(Mode::Reset)?;
    *state = CallState::Reset;
    handle.select_mode(direction.mode())?;
    *state = CallState::ModeSelected;

    let (body_len, last) = match direction {
        Direction::Encrypt => {
            let body_len = input.len() - input.len() % BLOCK_SIZE;
            (body_len, Some(final_block(&input[body_len..])))
        }
        Direction::Decrypt => (input.len(), None),
    };

    let mut blocks = 0;
    for (chunk, out) in input[..body_len]
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        let mut block: Block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        round_trip(handle, state, blocks, &block, out)?;
        blocks += 1;
    }

    if let Some(last) = last {
        let offset = blocks * BLOCK_SIZE;
        round_trip(
            handle,
            state,
            blocks,
            &last,
            &mut output[offset..offset + BLOCK_SIZE],
        )?;
        blocks += 1;
    }

    Ok(blocks)
}

fn round_trip<H: ChannelHandle>(
    handle: &mut H,
    state: &mut CallState,
    index: usize,
    block: &Block,
    out: &mut [u8],
) -> TransportResult<()> {
    *state = CallState::Streaming(index);
    trace!("block {}", index);
    handle.write_block(block)?;
    let processed = handle.read_block()?;
    out.copy_from_slice(&processed);
    Ok(())
}

/// Close `handle` after an operation. The operation's own error wins; a
/// close failure is reported only when the operation succeeded.
fn release<H: ChannelHandle, T>(handle: H, result: TransportResult<T>) -> TransportResult<T> {
    match result {
        Ok(value) => {
            handle.close()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(close_err) = handle.close() {
                warn!("close after failure also failed: {}", close_err);
            }
            Err(err)
        }
    }
}
