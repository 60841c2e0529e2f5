// Licensed under the Apache-2.0 license

//! End-to-end scenario with the sequential test vectors

use crate::common::{programmed_session, reference_decrypt, reference_encrypt, test_constants::*};
use wsaes_session::{strip_padding, CallState};
use wsaes_transport::{Mode, BLOCK_SIZE};

#[test]
fn test_fox_message_round_trip() {
    println!("Testing the 46-byte fox message...");

    let (fake, mut session) = programmed_session();
    assert_eq!(FOX.len(), 46);
    assert_eq!(fake.key_register(), Some(SEQUENTIAL_KEY));
    assert_eq!(fake.iv_register(), Some(SEQUENTIAL_IV));

    let ciphertext = session.encrypt(FOX).expect("Failed to encrypt");
    assert_eq!(ciphertext.len(), 48);
    assert_eq!(session.last_call_state(), CallState::Closed);

    let written = fake.written_blocks();
    assert_eq!(written.len(), 3);
    let (mode, last) = written[2];
    assert_eq!(mode, Mode::Encrypt);
    assert_eq!(&last[BLOCK_SIZE - 2..], &[0x02, 0x02]);
    assert_eq!(&last[..BLOCK_SIZE - 2], &FOX[32..]);

    assert_eq!(
        ciphertext,
        reference_encrypt(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, FOX)
    );

    let decrypted = session.decrypt(&ciphertext).expect("Failed to decrypt");
    assert_eq!(decrypted.len(), 48);
    assert_eq!(&decrypted[46..], &[0x02, 0x02]);
    assert_eq!(strip_padding(&decrypted).unwrap(), FOX);
    assert_eq!(
        reference_decrypt(&SEQUENTIAL_KEY, &SEQUENTIAL_IV, &ciphertext),
        FOX
    );

    println!("Fox round trip completed!");
}

#[test]
fn test_call_protocol_sequence() {
    let (fake, mut session) = programmed_session();
    let before = fake.ops();

    session.encrypt(FOX).expect("Failed to encrypt");
    let ops = fake.ops();

    // open, Reset, Encrypt, 3 × (write, read), close
    assert_eq!(ops.opens - before.opens, 1);
    assert_eq!(ops.selects - before.selects, 2);
    assert_eq!(ops.writes - before.writes, 3);
    assert_eq!(ops.reads - before.reads, 3);
    assert_eq!(ops.closes - before.closes, 1);
    assert_eq!(fake.open_handles(), 0);

    let stats = session.stats();
    assert_eq!(stats.blocks_transferred, 3);
    assert_eq!(stats.bytes_in, 46);
    assert_eq!(stats.bytes_out, 48);
}

#[test]
fn test_repeated_programming_is_idempotent() {
    let (_fake, mut session) = programmed_session();
    let first = session.encrypt(FOX).expect("Failed to encrypt");

    for _ in 0..3 {
        session.set_key(&SEQUENTIAL_KEY).expect("Failed to program key");
        session.set_iv(&SEQUENTIAL_IV).expect("Failed to program IV");
    }
    let again = session.encrypt(FOX).expect("Failed to encrypt");
    assert_eq!(first, again);

    // Each call starts from a Reset, so chaining never leaks between calls
    let third = session.encrypt(FOX).expect("Failed to encrypt");
    assert_eq!(first, third);
}

#[test]
fn test_new_key_changes_ciphertext() {
    let (_fake, mut session) = programmed_session();
    let first = session.encrypt(FOX).expect("Failed to encrypt");

    session.set_key(&OTHER_KEY).expect("Failed to program key");
    let second = session.encrypt(FOX).expect("Failed to encrypt");
    assert_ne!(first, second);
    assert_eq!(second, reference_encrypt(&OTHER_KEY, &SEQUENTIAL_IV, FOX));

    session.set_iv(&OTHER_IV).expect("Failed to program IV");
    let third = session.encrypt(FOX).expect("Failed to encrypt");
    assert_eq!(third, reference_encrypt(&OTHER_KEY, &OTHER_IV, FOX));
}
