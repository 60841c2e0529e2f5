// Licensed under the Apache-2.0 license

#![allow(clippy::not_unsafe_ptr_arg_deref)]

//! wsaes C Bindings
//!
//! C-compatible entry points matching `wsaescbc.h`. One process-wide session
//! sits behind the accelerator lock, so concurrent C callers are serialized
//! for the whole of each call.
//!
//! The device node defaults to `/dev/wsaeschar` and can be overridden with
//! the `WSAES_DEVICE` environment variable before the first call.

pub mod error;

use std::os::raw::c_int;

use lazy_static::lazy_static;
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;
use wsaes_session::{output_len, Accelerator, CipherSession, Direction};
use wsaes_transport::{CharDevice, ChannelConfig, Mode, IV_SIZE, KEY_SIZE};

pub use error::{status_code, WSAES_FAIL, WSAES_SUCCESS};

/// Environment variable naming the device node
pub const DEVICE_ENV: &str = "WSAES_DEVICE";

/// Mode values accepted by [`aes256`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsaesCipherMode {
    Reset = 0,
    Encrypt = 1,
    Decrypt = 2,
    SetIv = 3,
    SetKey = 4,
}

lazy_static! {
    static ref ACCELERATOR: Accelerator<CharDevice> =
        Accelerator::new(CipherSession::new(CharDevice::new(channel_config())));
}

fn channel_config() -> ChannelConfig {
    match std::env::var_os(DEVICE_ENV) {
        Some(path) => ChannelConfig::new().with_path(path),
        None => ChannelConfig::new(),
    }
}

fn direction_from(mode: c_int) -> Option<Direction> {
    let raw = u8::try_from(mode).ok()?;
    let mode = Mode::try_from(raw).ok()?;
    Direction::try_from(mode).ok()
}

/// Route library logging to stderr. `verbose` selects debug level.
#[no_mangle]
pub extern "C" fn wsaes_enable_logging(verbose: bool) -> i32 {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    match SimpleLogger::new().with_level(level).init() {
        Ok(()) => WSAES_SUCCESS,
        Err(_) => WSAES_FAIL,
    }
}

/// Check that the accelerator device is present
#[no_mangle]
pub extern "C" fn aes256init() -> i32 {
    let result = ACCELERATOR.acquire().and_then(|session| session.init());
    match result {
        Ok(()) => WSAES_SUCCESS,
        Err(err) => {
            error!("couldn't find device: {}", err);
            status_code(&err)
        }
    }
}

/// Program the 32-byte key pointed to by `keyp`
#[no_mangle]
pub extern "C" fn aes256setkey(keyp: *const u8) -> i32 {
    if keyp.is_null() {
        return WSAES_FAIL;
    }
    let mut key = [0u8; KEY_SIZE];
    // SAFETY: caller guarantees `keyp` points at KEY_SIZE readable bytes.
    key.copy_from_slice(unsafe { std::slice::from_raw_parts(keyp, KEY_SIZE) });

    let result = ACCELERATOR
        .acquire()
        .and_then(|mut session| session.set_key(&key));
    key.fill(0);

    match result {
        Ok(()) => WSAES_SUCCESS,
        Err(err) => {
            error!("failed to write key to the device: {}", err);
            status_code(&err)
        }
    }
}

/// Program the 16-byte IV pointed to by `ivp`
#[no_mangle]
pub extern "C" fn aes256setiv(ivp: *const u8) -> i32 {
    if ivp.is_null() {
        return WSAES_FAIL;
    }
    let mut iv = [0u8; IV_SIZE];
    // SAFETY: caller guarantees `ivp` points at IV_SIZE readable bytes.
    iv.copy_from_slice(unsafe { std::slice::from_raw_parts(ivp, IV_SIZE) });

    let result = ACCELERATOR
        .acquire()
        .and_then(|mut session| session.set_iv(&iv));

    match result {
        Ok(()) => WSAES_SUCCESS,
        Err(err) => {
            error!("failed to write IV to the device: {}", err);
            status_code(&err)
        }
    }
}

/// Encrypt or decrypt `inlen` bytes at `inp` into `outp`.
///
/// `mode` must be `WSAES_CIPHER_MODE_ENCRYPT` or `WSAES_CIPHER_MODE_DECRYPT`.
/// On encryption `outp` needs room for `inlen` rounded up to the next
/// multiple of 16, plus 16 when `inlen` is already a multiple. The produced
/// length is stored in `*outlenp`. Decrypted output keeps its padding.
#[no_mangle]
pub extern "C" fn aes256(
    mode: c_int,
    inp: *const u8,
    inlen: u32,
    outp: *mut u8,
    outlenp: *mut u32,
) -> i32 {
    if inp.is_null() || outp.is_null() || outlenp.is_null() {
        return WSAES_FAIL;
    }
    let Some(direction) = direction_from(mode) else {
        error!("invalid mode {}; must be encrypt or decrypt", mode);
        return WSAES_FAIL;
    };
    let out_len = match output_len(direction, inlen as usize) {
        Ok(len) => len,
        Err(err) => {
            error!("{}", err);
            return WSAES_FAIL;
        }
    };

    // SAFETY: caller guarantees `inp` holds `inlen` bytes and `outp` has room
    // for the documented output length.
    let input = unsafe { std::slice::from_raw_parts(inp, inlen as usize) };
    let output = unsafe { std::slice::from_raw_parts_mut(outp, out_len) };

    let result = ACCELERATOR
        .acquire()
        .and_then(|mut session| session.transform(direction, input, output));

    match result {
        Ok(written) => {
            // SAFETY: checked non-null above.
            unsafe { *outlenp = written as u32 };
            WSAES_SUCCESS
        }
        Err(err) => {
            error!("{} failed: {}", direction, err);
            status_code(&err)
        }
    }
}
