//! One-shot sealing and opening of secrets
//!
//! Composes the payload codec and the encryption envelope: the codec
//! turns text + attachments into a single plaintext string, the envelope
//! turns that into the encrypted container handed to the storage layer.
//! The codec itself never touches the crypto; this module is the only
//! place the two meet.

use crate::envelope;
use crate::error::Result;
use crate::payload::Payload;

/// Packs and encrypts a payload into an encrypted container string
pub fn seal(passphrase: &str, payload: &Payload) -> Result<String> {
    let plaintext = payload
        .pack()
        .map_err(|e| e.with_context("packing payload"))?;

    Ok(envelope::encrypt(passphrase, &plaintext))
}

/// Decrypts and unpacks a container string back into a payload
///
/// The result is always a full payload, even when the stored plaintext
/// was a bare secret without attachments.
pub fn open(passphrase: &str, container: &str) -> Result<Payload> {
    let plaintext = envelope::decrypt(passphrase, container)?;

    Payload::unpack(&plaintext).map_err(|e| e.with_context("unpacking decrypted payload"))
}
