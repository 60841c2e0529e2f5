// Licensed under the Apache-2.0 license

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wsaes_transport::{ChannelConfig, DEFAULT_DEVICE_PATH, IV_SIZE, KEY_SIZE};

/// File name searched for when no configuration path is given
pub const CONFIG_FILE_NAME: &str = "selftest-config.toml";

/// Self-test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestConfig {
    pub device: DeviceConfig,
    pub vectors: VectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Accelerator channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub path: PathBuf,
    #[serde(default = "default_exclusive")]
    pub exclusive: bool,
}

/// Test vectors; key and IV are hex strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    pub key: String,
    pub iv: String,
    pub message: String,
    /// Send the message with a trailing NUL, as a C string literal is sized
    #[serde(default = "default_nul_terminated")]
    pub nul_terminated: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub diagnostic: bool,
}

fn default_exclusive() -> bool {
    true
}

fn default_nul_terminated() -> bool {
    true
}

impl SelfTestConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: SelfTestConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Search the current directory and its parents for the config file,
    /// falling back to built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut current_dir = std::env::current_dir()?;

        loop {
            for candidate in [
                current_dir.join(CONFIG_FILE_NAME),
                current_dir.join("apps").join("selftest").join(CONFIG_FILE_NAME),
            ] {
                if candidate.exists() {
                    return Self::from_file(candidate);
                }
            }

            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        std::fs::write(path.as_ref(), contents)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;

        Ok(())
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::new()
            .with_path(&self.device.path)
            .with_exclusive(self.device.exclusive)
    }

    pub fn key(&self) -> Result<[u8; KEY_SIZE]> {
        decode_fixed(&self.vectors.key).context("Invalid key in configuration")
    }

    pub fn iv(&self) -> Result<[u8; IV_SIZE]> {
        decode_fixed(&self.vectors.iv).context("Invalid IV in configuration")
    }

    /// Message bytes as sent to the accelerator
    pub fn message_bytes(&self) -> Vec<u8> {
        let mut bytes = self.vectors.message.as_bytes().to_vec();
        if self.vectors.nul_terminated {
            bytes.push(0);
        }
        bytes
    }
}

fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(text.trim())?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("expected {} bytes, got {}", N, len))
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        let key: Vec<u8> = (0..KEY_SIZE as u8).collect();
        let iv: Vec<u8> = (0..IV_SIZE as u8).collect();
        Self {
            device: DeviceConfig {
                path: PathBuf::from(DEFAULT_DEVICE_PATH),
                exclusive: true,
            },
            vectors: VectorConfig {
                key: hex::encode_upper(key),
                iv: hex::encode_upper(iv),
                message: "The Quick Brown Fox Jumped Over The Lazy Dog!".to_string(),
                nul_terminated: true,
            },
            output: OutputConfig::default(),
        }
    }
}
