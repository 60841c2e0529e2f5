// Licensed under the Apache-2.0 license

//! wsaes Transport Layer
//!
//! Device channel abstraction for the AES-256-CBC accelerator. The channel is
//! an exclusively-openable duplex byte endpoint: a control request selects the
//! accelerator mode, after which data moves in fixed 16-byte blocks.
//!
//! This layer has no cipher knowledge. Sequencing of reset, mode selection and
//! block transfers belongs to the session layer.

pub mod chardev;
pub mod error;
pub mod mode;

use std::path::PathBuf;

// Re-export commonly used types
pub use chardev::{CharDevice, CharDeviceHandle};
pub use error::{TransportError, TransportResult};
pub use mode::Mode;

/// Size of the accelerator transfer unit in bytes
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key length in bytes
pub const KEY_SIZE: usize = 32;

/// CBC initialization vector length in bytes
pub const IV_SIZE: usize = 16;

/// Largest plaintext accepted by a single accelerator call
pub const MAX_DATA_SIZE: usize = 256;

/// Default device node exported by the kernel module
pub const DEFAULT_DEVICE_PATH: &str = "/dev/wsaeschar";

/// One transfer unit
pub type Block = [u8; BLOCK_SIZE];

/// Channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub path: PathBuf,
    pub exclusive: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DEVICE_PATH),
            exclusive: true,
        }
    }
}

impl ChannelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }
}

/// Source of channel handles.
///
/// Opening acquires exclusive access to the accelerator; the returned handle
/// is the only way to talk to it until it is closed or dropped.
pub trait DeviceChannel: Send {
    type Handle: ChannelHandle;

    /// Check that the channel endpoint exists without opening it
    fn probe(&self) -> TransportResult<()>;

    /// Acquire the channel
    fn open(&self) -> TransportResult<Self::Handle>;
}

/// An open channel. Not `Clone`: a handle can only be moved, and `close`
/// consumes it.
pub trait ChannelHandle {
    /// Switch the accelerator's mode register
    fn select_mode(&mut self, mode: Mode) -> TransportResult<()>;

    /// Read back the accelerator's mode register
    fn query_mode(&mut self) -> TransportResult<Mode>;

    /// Transfer a register payload (key, IV or block) in a single write
    fn write_payload(&mut self, payload: &[u8]) -> TransportResult<()>;

    /// Transfer exactly one block
    fn write_block(&mut self, block: &Block) -> TransportResult<()> {
        self.write_payload(block)
    }

    /// Wait for one processed block
    fn read_block(&mut self) -> TransportResult<Block>;

    /// Release the channel
    fn close(self) -> TransportResult<()>
    where
        Self: Sized;
}
