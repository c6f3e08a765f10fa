//! Ephemeral passphrase generation
//!
//! Passphrases are generated locally, handed to the caller for embedding
//! in a share link fragment, and never sent to the server. They are
//! random base-36 strings (digits and lowercase letters).

use rand::Rng;
use rand::rand_core::UnwrapErr;
use rand::rngs::SysRng;

/// Default length of generated passphrases
pub const DEFAULT_LENGTH: usize = 20;

/// Base-36 alphabet used for generated passphrases
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a random passphrase of the default length
pub fn generate() -> String {
    generate_with_length(DEFAULT_LENGTH)
}

/// Generates a random passphrase of the given length
pub fn generate_with_length(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    UnwrapErr(SysRng).fill_bytes(&mut bytes);

    bytes
        .iter()
        .map(|&b| ALPHABET[b as usize % ALPHABET.len()] as char)
        .collect()
}
