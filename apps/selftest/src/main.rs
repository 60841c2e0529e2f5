// Licensed under the Apache-2.0 license

//! wsaes Self-Test Binary
//!
//! Command-line front end that runs the encrypt/decrypt/compare self-test
//! against the accelerator's character device.

use anyhow::Result;
use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use wsaes_provider::WsaesEngine;
use wsaes_selftest::{run_self_test, SelfTestConfig};
use wsaes_session::CipherSession;
use wsaes_transport::CharDevice;

#[derive(Parser)]
#[command(name = "wsaes-selftest")]
#[command(about = "AES-256-CBC accelerator self-test - encrypts, decrypts and compares a message")]
#[command(version)]
struct Args {
    /// Device node to use instead of the configured one
    #[arg(short, long, help = "Accelerator device node (e.g. /dev/wsaeschar)")]
    device: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file with test vectors")]
    config: Option<PathBuf>,

    /// Message to round-trip instead of the configured one
    #[arg(short, long)]
    message: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log every transform's input and output
    #[arg(long)]
    diagnostic: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose || args.diagnostic {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            SelfTestConfig::from_file(path)?
        }
        None => SelfTestConfig::load_default()?,
    };
    if let Some(device) = args.device {
        config.device.path = device;
    }
    if let Some(message) = args.message {
        config.vectors.message = message;
    }

    let key = config.key()?;
    let iv = config.iv()?;
    let message = config.message_bytes();

    let engine = WsaesEngine::new(CipherSession::new(CharDevice::new(config.channel_config())))
        .set_diagnostic(args.diagnostic || config.output.diagnostic);

    info!("Using device {:?}", config.device.path);
    let report = run_self_test(&engine, &key, &iv, &message)?;

    if !report.length_matches {
        error!(
            "Recovered {} bytes, expected {}",
            report.recovered.len(),
            message.len()
        );
    }
    for index in &report.mismatches {
        error!("Incorrect value at element {}", index);
    }

    if report.passed() {
        println!("\n✓ Test status: SUCCESS");
        std::process::exit(0);
    } else {
        println!("\n✗ Test status: FAILED");
        std::process::exit(1);
    }
}
