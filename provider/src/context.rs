// Licensed under the Apache-2.0 license

//! Per-operation cipher context

use std::sync::Arc;

use log::debug;
use wsaes_session::{Accelerator, Direction};
use wsaes_transport::{DeviceChannel, IV_SIZE, KEY_SIZE};
use zeroize::Zeroizing;

use crate::{CipherDescriptor, ProviderError, ProviderResult};

/// Host-facing cipher lifecycle
pub trait CipherContext {
    /// Bind key, IV and direction
    fn init(&mut self, key: &[u8], iv: &[u8], direction: Direction) -> ProviderResult<()>;

    /// Transform one chunk; returns bytes written to `output`
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> ProviderResult<usize>;

    /// Flush any buffered output; returns bytes written to `output`
    fn finalize(&mut self, output: &mut [u8]) -> ProviderResult<usize>;

    /// Wipe key material
    fn cleanup(&mut self);
}

struct Binding {
    key: Zeroizing<[u8; KEY_SIZE]>,
    iv: Zeroizing<[u8; IV_SIZE]>,
    direction: Direction,
}

/// AES-256-CBC context backed by the shared accelerator.
///
/// Each `update` is padded on its own when encrypting, so a message must be
/// passed in a single `update` (at most 256 bytes) to match a software
/// AES-CBC over the whole message.
pub struct WsaesCipherContext<C: DeviceChannel> {
    accelerator: Arc<Accelerator<C>>,
    descriptor: &'static CipherDescriptor,
    binding: Option<Binding>,
    diagnostic: bool,
}

impl<C: DeviceChannel> WsaesCipherContext<C> {
    pub(crate) fn new(
        accelerator: Arc<Accelerator<C>>,
        descriptor: &'static CipherDescriptor,
        diagnostic: bool,
    ) -> Self {
        Self {
            accelerator,
            descriptor,
            binding: None,
            diagnostic,
        }
    }

    pub fn descriptor(&self) -> &'static CipherDescriptor {
        self.descriptor
    }

    pub fn direction(&self) -> Option<Direction> {
        self.binding.as_ref().map(|b| b.direction)
    }
}

impl<C: DeviceChannel> CipherContext for WsaesCipherContext<C> {
    fn init(&mut self, key: &[u8], iv: &[u8], direction: Direction) -> ProviderResult<()> {
        let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| ProviderError::InvalidKeyLength {
            expected: KEY_SIZE,
            got: key.len(),
        })?;
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| ProviderError::InvalidIvLength {
            expected: IV_SIZE,
            got: iv.len(),
        })?;
        let key = Zeroizing::new(key);
        let iv = Zeroizing::new(iv);

        self.binding = None;
        {
            let mut session = self.accelerator.acquire()?;
            session.init()?;
            session.set_key(&key)?;
            session.set_iv(&iv)?;
        }

        debug!("context bound for {}", direction);
        self.binding = Some(Binding { key, iv, direction });
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> ProviderResult<usize> {
        let binding = self.binding.as_ref().ok_or(ProviderError::NotInitialized)?;

        let mut session = self.accelerator.acquire()?;
        // Another context may have reprogrammed the shared registers since init.
        if !session.holds(&binding.key, &binding.iv) {
            debug!("re-binding key and IV");
            session.set_key(&binding.key)?;
            session.set_iv(&binding.iv)?;
        }

        let written = session.transform(binding.direction, input, output)?;
        drop(session);

        if self.diagnostic {
            debug!(
                "{} in  = {}",
                binding.direction,
                hex::encode_upper(input)
            );
            debug!(
                "{} out = {}",
                binding.direction,
                hex::encode_upper(&output[..written])
            );
        }
        Ok(written)
    }

    fn finalize(&mut self, _output: &mut [u8]) -> ProviderResult<usize> {
        if self.binding.is_none() {
            return Err(ProviderError::NotInitialized);
        }
        Ok(0)
    }

    fn cleanup(&mut self) {
        self.binding = None;
    }
}
