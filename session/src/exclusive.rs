// Licensed under the Apache-2.0 license

//! Exclusive access to a shared accelerator
//!
//! Mode, key and IV live in accelerator registers with no per-caller
//! isolation, so callers sharing one accelerator go through a single lock
//! held for the whole open…close span of each call.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, TryLockError};

use wsaes_transport::DeviceChannel;

use crate::{CipherSession, ProtocolError, ProtocolResult};

/// A cipher session shared between threads
pub struct Accelerator<C: DeviceChannel> {
    inner: Mutex<CipherSession<C>>,
}

impl<C: DeviceChannel> Accelerator<C> {
    pub fn new(session: CipherSession<C>) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Block until the accelerator is free
    pub fn acquire(&self) -> ProtocolResult<AcceleratorGuard<'_, C>> {
        self.inner
            .lock()
            .map(|guard| AcceleratorGuard { guard })
            .map_err(|_| ProtocolError::LockPoisoned)
    }

    /// Take the accelerator only if nobody holds it
    pub fn try_acquire(&self) -> ProtocolResult<Option<AcceleratorGuard<'_, C>>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(Some(AcceleratorGuard { guard })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Poisoned(_)) => Err(ProtocolError::LockPoisoned),
        }
    }

    pub fn into_inner(self) -> ProtocolResult<CipherSession<C>> {
        self.inner
            .into_inner()
            .map_err(|_| ProtocolError::LockPoisoned)
    }
}

/// Exclusive use of the accelerator's session. Not `Clone`; dropping it lets
/// the next caller in.
pub struct AcceleratorGuard<'a, C: DeviceChannel> {
    guard: MutexGuard<'a, CipherSession<C>>,
}

impl<C: DeviceChannel> Deref for AcceleratorGuard<'_, C> {
    type Target = CipherSession<C>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<C: DeviceChannel> DerefMut for AcceleratorGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
