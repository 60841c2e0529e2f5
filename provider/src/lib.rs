// Licensed under the Apache-2.0 license

//! wsaes Cipher Provider
//!
//! Thin shell that lets a generic crypto-provider host drive the accelerator.
//! The host's init/update/final/cleanup lifecycle maps onto the cipher
//! session: `init` programs key and IV, each `update` is one accelerator
//! transform, `final` emits nothing and `cleanup` wipes key material.
//!
//! ```rust,ignore
//! use wsaes_provider::{CipherAlgorithm, CipherContext, WsaesEngine};
//! use wsaes_session::{CipherSession, Direction};
//! use wsaes_transport::CharDevice;
//!
//! let engine = WsaesEngine::new(CipherSession::new(CharDevice::default()));
//! engine.init()?;
//!
//! let mut ctx = engine.new_context(CipherAlgorithm::Aes256Cbc)?;
//! ctx.init(&key, &iv, Direction::Encrypt)?;
//! let n = ctx.update(b"attack at dawn", &mut out)?;
//! ctx.finalize(&mut out[n..])?;
//! ctx.cleanup();
//! ```

pub mod context;
pub mod error;

use std::sync::Arc;

use log::debug;
use wsaes_session::{Accelerator, CipherSession};
use wsaes_transport::{DeviceChannel, BLOCK_SIZE, IV_SIZE, KEY_SIZE, MAX_DATA_SIZE};

pub use context::{CipherContext, WsaesCipherContext};
pub use error::{ProviderError, ProviderResult};

/// Engine identifier registered with the host
pub const ENGINE_ID: &str = "wsaes";

/// Human readable engine name
pub const ENGINE_NAME: &str = "wsaes AES-256-CBC hardware accelerator on the Xilinx ZYNQ-7000";

/// Cipher algorithms a provider host may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
    Aes256Gcm,
}

/// Block chaining mode of a provided cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainingMode {
    Cbc,
}

/// Static description of a provided cipher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherDescriptor {
    pub algorithm: CipherAlgorithm,
    pub block_size: usize,
    pub key_len: usize,
    pub iv_len: usize,
    pub mode: ChainingMode,
    /// Per-context working storage the host should reserve
    pub ctx_size: usize,
}

pub static AES_256_CBC: CipherDescriptor = CipherDescriptor {
    algorithm: CipherAlgorithm::Aes256Cbc,
    block_size: BLOCK_SIZE,
    key_len: KEY_SIZE,
    iv_len: IV_SIZE,
    mode: ChainingMode::Cbc,
    ctx_size: MAX_DATA_SIZE,
};

static SUPPORTED: [CipherAlgorithm; 1] = [CipherAlgorithm::Aes256Cbc];

/// Registration surface a provider host consumes
pub trait CipherProvider {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// Every algorithm this provider implements
    fn ciphers(&self) -> &'static [CipherAlgorithm];

    /// Descriptor for `algorithm`, or `None` when not provided
    fn cipher(&self, algorithm: CipherAlgorithm) -> Option<&'static CipherDescriptor>;
}

/// The accelerator engine. Cheap to clone; clones share one accelerator lock.
pub struct WsaesEngine<C: DeviceChannel> {
    accelerator: Arc<Accelerator<C>>,
    diagnostic: bool,
}

impl<C: DeviceChannel> Clone for WsaesEngine<C> {
    fn clone(&self) -> Self {
        Self {
            accelerator: Arc::clone(&self.accelerator),
            diagnostic: self.diagnostic,
        }
    }
}

impl<C: DeviceChannel> WsaesEngine<C> {
    pub fn new(session: CipherSession<C>) -> Self {
        Self::from_accelerator(Arc::new(Accelerator::new(session)))
    }

    pub fn from_accelerator(accelerator: Arc<Accelerator<C>>) -> Self {
        Self {
            accelerator,
            diagnostic: false,
        }
    }

    /// Log every transform's input and output at debug level
    pub fn set_diagnostic(mut self, diagnostic: bool) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    pub fn is_diagnostic(&self) -> bool {
        self.diagnostic
    }

    pub fn accelerator(&self) -> &Arc<Accelerator<C>> {
        &self.accelerator
    }

    /// Engine initialization: confirm the accelerator is reachable
    pub fn init(&self) -> ProviderResult<()> {
        debug!("{}: init", ENGINE_ID);
        self.accelerator.acquire()?.init()?;
        Ok(())
    }

    /// Engine teardown. The channel is opened per call, so nothing is held.
    pub fn finish(&self) -> ProviderResult<()> {
        debug!("{}: finish", ENGINE_ID);
        Ok(())
    }

    /// Fresh context for `algorithm`
    pub fn new_context(&self, algorithm: CipherAlgorithm) -> ProviderResult<WsaesCipherContext<C>> {
        let descriptor = self
            .cipher(algorithm)
            .ok_or(ProviderError::UnsupportedCipher(algorithm))?;
        Ok(WsaesCipherContext::new(
            Arc::clone(&self.accelerator),
            descriptor,
            self.diagnostic,
        ))
    }
}

impl<C: DeviceChannel> CipherProvider for WsaesEngine<C> {
    fn id(&self) -> &'static str {
        ENGINE_ID
    }

    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn ciphers(&self) -> &'static [CipherAlgorithm] {
        &SUPPORTED
    }

    fn cipher(&self, algorithm: CipherAlgorithm) -> Option<&'static CipherDescriptor> {
        match algorithm {
            CipherAlgorithm::Aes256Cbc => Some(&AES_256_CBC),
            _ => None,
        }
    }
}
