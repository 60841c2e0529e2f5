// Licensed under the Apache-2.0 license

//! Length, capacity and programming-state boundaries

use crate::common::{message, programmed_session, FakeAccelerator};
use wsaes_session::{CallState, CipherSession, Direction, ProtocolError, MAX_FRAMED_SIZE};
use wsaes_transport::{BLOCK_SIZE, MAX_DATA_SIZE};

#[test]
fn test_largest_plaintext_is_accepted() {
    let (_fake, mut session) = programmed_session();

    let ciphertext = session
        .encrypt(&message(MAX_DATA_SIZE))
        .expect("Failed to encrypt 256 bytes");
    assert_eq!(ciphertext.len(), MAX_FRAMED_SIZE);

    // The framed ciphertext must decrypt in one call
    let decrypted = session.decrypt(&ciphertext).expect("Failed to decrypt");
    assert_eq!(decrypted.len(), MAX_FRAMED_SIZE);
}

#[test]
fn test_invalid_lengths_do_no_io() {
    let (fake, mut session) = programmed_session();
    let before = fake.ops();

    let cases = [
        (Direction::Encrypt, 0),
        (Direction::Encrypt, MAX_DATA_SIZE + 1),
        (Direction::Decrypt, 0),
        (Direction::Decrypt, 17),
        (Direction::Decrypt, 15),
        (Direction::Decrypt, MAX_FRAMED_SIZE + BLOCK_SIZE),
    ];

    for (direction, len) in cases {
        let input = vec![0xAAu8; len];
        let mut output = vec![0x55u8; 512];
        let result = session.transform(direction, &input, &mut output);

        assert_eq!(result, Err(ProtocolError::InvalidLength { direction, len }));
        // Nothing touched, not even the output
        assert!(output.iter().all(|b| *b == 0x55));
    }

    assert_eq!(fake.ops(), before);
    assert_eq!(session.stats().calls_failed, 0);
}

#[test]
fn test_output_buffer_too_small() {
    let (fake, mut session) = programmed_session();
    let before = fake.ops();

    let mut output = [0u8; 47];
    let result = session.transform(Direction::Encrypt, &message(46), &mut output);
    assert_eq!(
        result,
        Err(ProtocolError::BufferTooSmall {
            needed: 48,
            capacity: 47
        })
    );
    assert_eq!(fake.ops(), before);
}

#[test]
fn test_larger_output_buffer_reports_produced_length() {
    let (_fake, mut session) = programmed_session();

    let mut output = [0xEEu8; 64];
    let written = session
        .transform(Direction::Encrypt, &message(20), &mut output)
        .expect("Failed to encrypt");

    assert_eq!(written, 32);
    // Bytes beyond the produced length are left alone
    assert!(output[32..].iter().all(|b| *b == 0xEE));
}

#[test]
fn test_transform_before_programming() {
    let fake = FakeAccelerator::new();
    let mut session = CipherSession::new(fake.clone());

    assert_eq!(
        session.encrypt(b"too early"),
        Err(ProtocolError::NotProgrammed(Direction::Encrypt))
    );

    session
        .set_key(&[1u8; 32])
        .expect("Failed to program key");
    assert_eq!(
        session.decrypt(&[0u8; 16]),
        Err(ProtocolError::NotProgrammed(Direction::Decrypt))
    );
    assert_eq!(session.last_call_state(), CallState::Idle);

    // Only the key programming reached the channel
    assert_eq!(fake.ops().opens, 1);
    assert_eq!(fake.ops().reads, 0);
}

#[test]
fn test_forget_requires_reprogramming() {
    let (_fake, mut session) = programmed_session();
    session.encrypt(b"ok").expect("Failed to encrypt");

    session.forget();
    assert!(!session.is_programmed());
    assert_eq!(
        session.encrypt(b"ok"),
        Err(ProtocolError::NotProgrammed(Direction::Encrypt))
    );
}
