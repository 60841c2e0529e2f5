// Licensed under the Apache-2.0 license

//! Character device channel
//!
//! Talks to the kernel module behind `/dev/wsaeschar`. Mode switches are
//! ioctls carrying the mode value as the argument; blocks move with plain
//! `write(2)`/`read(2)` calls on the same descriptor.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::Path;

use log::{debug, trace};
use nix::fcntl::{flock, FlockArg};

use crate::{
    Block, ChannelConfig, ChannelHandle, DeviceChannel, Mode, TransportError, TransportResult,
    BLOCK_SIZE,
};

/// Major number the kernel module registers; doubles as the ioctl type
const WSAES_IOC_MAGIC: u8 = 100;

mod ioctl {
    use super::WSAES_IOC_MAGIC;

    // IOCTL_SET_MODE is declared _IOR(100, 0, char) but the mode travels as the
    // argument value, not through a pointer.
    nix::ioctl_write_int_bad!(
        wsaes_set_mode,
        nix::request_code_read!(WSAES_IOC_MAGIC, 0, core::mem::size_of::<libc::c_char>())
    );

    nix::ioctl_read!(wsaes_get_mode, WSAES_IOC_MAGIC, 1, libc::c_char);
}

/// The accelerator's character device
#[derive(Debug, Clone, Default)]
pub struct CharDevice {
    config: ChannelConfig,
}

impl CharDevice {
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

impl DeviceChannel for CharDevice {
    type Handle = CharDeviceHandle;

    fn probe(&self) -> TransportResult<()> {
        if self.config.path.exists() {
            debug!("found device {}", self.config.path.display());
            Ok(())
        } else {
            Err(TransportError::Unavailable {
                reason: "device node not found",
                errno: Some(libc::ENOENT),
            })
        }
    }

    fn open(&self) -> TransportResult<CharDeviceHandle> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.config.path)
            .map_err(|e| TransportError::Unavailable {
                reason: "failed to open device node",
                errno: e.raw_os_error(),
            })?;

        if self.config.exclusive {
            flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock).map_err(|errno| {
                TransportError::Unavailable {
                    reason: "channel held exclusively elsewhere",
                    errno: Some(errno as i32),
                }
            })?;
        }

        trace!("opened {}", self.config.path.display());
        Ok(CharDeviceHandle { file })
    }
}

/// Open descriptor on the character device. Dropping it releases the
/// channel, including the exclusive lock.
#[derive(Debug)]
pub struct CharDeviceHandle {
    file: File,
}

impl ChannelHandle for CharDeviceHandle {
    fn select_mode(&mut self, mode: Mode) -> TransportResult<()> {
        trace!("select mode {:?}", mode);
        // SAFETY: the descriptor is owned by `self.file` and the request takes
        // its argument by value.
        let res =
            unsafe { ioctl::wsaes_set_mode(self.file.as_raw_fd(), u8::from(mode) as libc::c_int) };
        res.map(|_| ())
            .map_err(|errno| TransportError::ControlRejected {
                mode,
                errno: Some(errno as i32),
            })
    }

    fn query_mode(&mut self) -> TransportResult<Mode> {
        let mut raw: libc::c_char = 0;
        // SAFETY: `raw` outlives the call and is the size the request encodes.
        let res = unsafe { ioctl::wsaes_get_mode(self.file.as_raw_fd(), &mut raw) };
        res.map_err(|errno| TransportError::QueryFailed {
            errno: Some(errno as i32),
        })?;
        let raw = raw as u8;
        Mode::try_from(raw).map_err(|_| TransportError::UnknownMode(raw))
    }

    fn write_payload(&mut self, payload: &[u8]) -> TransportResult<()> {
        match self.file.write(payload) {
            Ok(n) if n == payload.len() => Ok(()),
            Ok(n) => Err(TransportError::ShortWrite {
                written: n,
                expected: payload.len(),
                errno: None,
            }),
            Err(e) => Err(TransportError::ShortWrite {
                written: 0,
                expected: payload.len(),
                errno: e.raw_os_error(),
            }),
        }
    }

    fn read_block(&mut self) -> TransportResult<Block> {
        let mut block = [0u8; BLOCK_SIZE];
        match self.file.read(&mut block) {
            Ok(BLOCK_SIZE) => Ok(block),
            Ok(n) => Err(TransportError::ShortRead {
                read: n,
                expected: BLOCK_SIZE,
                errno: None,
            }),
            Err(e) => Err(TransportError::ShortRead {
                read: 0,
                expected: BLOCK_SIZE,
                errno: e.raw_os_error(),
            }),
        }
    }

    fn close(self) -> TransportResult<()> {
        nix::unistd::close(self.file.into_raw_fd()).map_err(|errno| {
            TransportError::CloseFailed {
                errno: Some(errno as i32),
            }
        })
    }
}
