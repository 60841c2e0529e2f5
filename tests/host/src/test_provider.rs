// Licensed under the Apache-2.0 license

//! Cipher provider lifecycle over the software accelerator

use crate::common::{message, reference_encrypt, test_constants::*, FakeAccelerator};
use wsaes_provider::{
    CipherAlgorithm, CipherContext, CipherProvider, ProviderError, WsaesEngine, AES_256_CBC,
    ENGINE_ID,
};
use wsaes_session::{strip_padding, CipherSession, Direction, ProtocolError};

fn engine() -> (FakeAccelerator, WsaesEngine<FakeAccelerator>) {
    let fake = FakeAccelerator::new();
    let engine = WsaesEngine::new(CipherSession::new(fake.clone()));
    (fake, engine)
}

#[test]
fn test_engine_registration() {
    let (_fake, engine) = engine();

    assert_eq!(engine.id(), ENGINE_ID);
    assert!(!engine.name().is_empty());
    assert_eq!(engine.ciphers(), &[CipherAlgorithm::Aes256Cbc]);

    let descriptor = engine
        .cipher(CipherAlgorithm::Aes256Cbc)
        .expect("AES-256-CBC must be provided");
    assert_eq!(descriptor, &AES_256_CBC);
    assert_eq!(descriptor.block_size, 16);
    assert_eq!(descriptor.key_len, 32);
    assert_eq!(descriptor.iv_len, 16);

    for other in [
        CipherAlgorithm::Aes128Cbc,
        CipherAlgorithm::Aes192Cbc,
        CipherAlgorithm::Aes256Gcm,
    ] {
        assert!(engine.cipher(other).is_none());
        assert_eq!(
            engine.new_context(other).err(),
            Some(ProviderError::UnsupportedCipher(other))
        );
    }
}

#[test]
fn test_context_lifecycle() {
    println!("Testing provider init/update/final/cleanup...");

    let (fake, engine) = engine();
    engine.init().expect("Failed to init engine");
    assert_eq!(fake.ops().probes, 1);

    let mut ctx = engine
        .new_context(CipherAlgorithm::Aes256Cbc)
        .expect("Failed to create context");
    assert_eq!(ctx.direction(), None);
    ctx.init(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, Direction::Encrypt)
        .expect("Failed to init context");
    assert_eq!(ctx.direction(), Some(Direction::Encrypt));
    assert_eq!(fake.key_register(), Some(SEQUENTIAL_KEY));

    let mut ciphertext = [0u8; 48];
    let n = ctx.update(FOX, &mut ciphertext).expect("Failed to update");
    assert_eq!(n, 48);
    assert_eq!(ctx.finalize(&mut ciphertext[n..]).unwrap(), 0);
    ctx.cleanup();
    assert_eq!(
        ciphertext.to_vec(),
        reference_encrypt(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, FOX)
    );

    // A cleaned-up context must be re-initialized
    assert_eq!(
        ctx.update(FOX, &mut ciphertext),
        Err(ProviderError::NotInitialized)
    );
    assert_eq!(ctx.finalize(&mut []), Err(ProviderError::NotInitialized));

    let mut dctx = engine.new_context(CipherAlgorithm::Aes256Cbc).unwrap();
    dctx.init(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, Direction::Decrypt)
        .expect("Failed to init context");
    let mut plaintext = [0u8; 48];
    let n = dctx.update(&ciphertext, &mut plaintext).expect("Failed to update");
    assert_eq!(strip_padding(&plaintext[..n]).unwrap(), FOX);

    engine.finish().expect("Failed to finish engine");
    println!("Provider lifecycle test completed!");
}

#[test]
fn test_context_rejects_bad_key_material() {
    let (fake, engine) = engine();
    let mut ctx = engine.new_context(CipherAlgorithm::Aes256Cbc).unwrap();

    assert_eq!(
        ctx.init(&[0u8; 16], &SEQUENTIAL_IV, Direction::Encrypt),
        Err(ProviderError::InvalidKeyLength {
            expected: 32,
            got: 16
        })
    );
    assert_eq!(
        ctx.init(&SEQUENTIAL_KEY, &[0u8; 8], Direction::Encrypt),
        Err(ProviderError::InvalidIvLength {
            expected: 16,
            got: 8
        })
    );
    assert_eq!(fake.ops().opens, 0);
}

#[test]
fn test_update_length_errors_pass_through() {
    let (_fake, engine) = engine();
    let mut ctx = engine.new_context(CipherAlgorithm::Aes256Cbc).unwrap();
    ctx.init(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, Direction::Encrypt)
        .unwrap();

    let mut output = [0u8; 512];
    assert_eq!(
        ctx.update(&message(257), &mut output),
        Err(ProviderError::Protocol(ProtocolError::InvalidLength {
            direction: Direction::Encrypt,
            len: 257
        }))
    );
}

#[test]
fn test_interleaved_contexts_rebind_key_material() {
    let (fake, engine) = engine();

    let mut first = engine.new_context(CipherAlgorithm::Aes256Cbc).unwrap();
    first
        .init(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, Direction::Encrypt)
        .unwrap();

    // The second context reprograms the shared registers
    let mut second = engine.new_context(CipherAlgorithm::Aes256Cbc).unwrap();
    second.init(&OTHER_KEY, &OTHER_IV, Direction::Encrypt).unwrap();
    assert_eq!(fake.key_register(), Some(OTHER_KEY));

    let mut out_first = [0u8; 48];
    first.update(FOX, &mut out_first).unwrap();
    assert_eq!(fake.key_register(), Some(SEQUENTIAL_KEY));
    assert_eq!(
        out_first.to_vec(),
        reference_encrypt(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, FOX)
    );

    let mut out_second = [0u8; 48];
    second.update(FOX, &mut out_second).unwrap();
    assert_eq!(
        out_second.to_vec(),
        reference_encrypt(&OTHER_KEY, &OTHER_IV, FOX)
    );

    // Consecutive updates on one context reprogram nothing
    let opens = fake.ops().opens;
    second.update(FOX, &mut out_second).unwrap();
    assert_eq!(fake.ops().opens, opens + 1);
}

#[test]
fn test_diagnostic_flag_is_inherited() {
    let (_fake, engine) = engine();
    assert!(!engine.is_diagnostic());

    let engine = engine.set_diagnostic(true);
    assert!(engine.is_diagnostic());

    let clone = engine.clone();
    assert!(clone.is_diagnostic());

    // Diagnostic output does not change results
    let mut ctx = clone.new_context(CipherAlgorithm::Aes256Cbc).unwrap();
    ctx.init(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, Direction::Encrypt)
        .unwrap();
    let mut out = [0u8; 48];
    assert_eq!(ctx.update(FOX, &mut out).unwrap(), 48);
    assert_eq!(
        out.to_vec(),
        reference_encrypt(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, FOX)
    );
}

#[test]
fn test_engine_init_reports_missing_device() {
    let (fake, engine) = engine();
    fake.set_faults(|f| f.missing = true);

    let err = engine.init().unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Protocol(ProtocolError::TransportFailure(_))
    ));
}
