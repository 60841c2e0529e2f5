// Licensed under the Apache-2.0 license

//! wsaes Self-Test
//!
//! Encrypts a message through the provider, decrypts the result, strips the
//! padding and compares against the input message byte for byte.

pub mod config;

use anyhow::{Context, Result};
use log::{debug, info};
use wsaes_provider::{CipherAlgorithm, CipherContext, CipherProvider, WsaesEngine};
use wsaes_session::{padded_len, strip_padding, Direction};
use wsaes_transport::{DeviceChannel, IV_SIZE, KEY_SIZE};

pub use config::SelfTestConfig;

/// Outcome of one self-test run
#[derive(Debug, Clone)]
pub struct SelfTestReport {
    pub ciphertext: Vec<u8>,
    pub recovered: Vec<u8>,
    /// Offsets where the recovered message differs from the input
    pub mismatches: Vec<usize>,
    pub length_matches: bool,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.length_matches && self.mismatches.is_empty()
    }
}

/// Run the round trip through `engine`
pub fn run_self_test<C: DeviceChannel>(
    engine: &WsaesEngine<C>,
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    message: &[u8],
) -> Result<SelfTestReport> {
    engine.init().context("Accelerator could not be initialized")?;
    info!("Initialized engine [{}] {}", engine.id(), engine.name());

    let capacity = padded_len(message.len());
    let ciphertext = transform(engine, key, iv, Direction::Encrypt, message, capacity)
        .context("Encrypt failed")?;
    debug!("ciphertext = {}", hex::encode_upper(&ciphertext));

    let decrypted = transform(engine, key, iv, Direction::Decrypt, &ciphertext, ciphertext.len())
        .context("Decrypt failed")?;
    let recovered = strip_padding(&decrypted)
        .context("Decrypted data carries malformed padding")?
        .to_vec();

    let mismatches: Vec<usize> = message
        .iter()
        .zip(recovered.iter())
        .enumerate()
        .filter(|(_, (expected, actual))| expected != actual)
        .map(|(index, _)| index)
        .collect();

    Ok(SelfTestReport {
        length_matches: recovered.len() == message.len(),
        ciphertext,
        recovered,
        mismatches,
    })
}

fn transform<C: DeviceChannel>(
    engine: &WsaesEngine<C>,
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    direction: Direction,
    input: &[u8],
    capacity: usize,
) -> Result<Vec<u8>> {
    let mut ctx = engine.new_context(CipherAlgorithm::Aes256Cbc)?;
    ctx.init(key, iv, direction)?;

    let mut output = vec![0u8; capacity];
    let mut len = ctx.update(input, &mut output)?;
    len += ctx.finalize(&mut output[len..])?;
    ctx.cleanup();

    output.truncate(len);
    Ok(output)
}
