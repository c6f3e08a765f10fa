//! Passphrase-based envelope encryption
//!
//! This module implements the salted container format emitted by
//! `openssl enc`:
//! - banner: 8 bytes, ASCII `Salted__`
//! - salt: 8 bytes
//! - ciphertext: AES-256-CBC with PKCS#7 padding
//!
//! Key and IV are derived together from (passphrase, salt) with
//! PBKDF2-HMAC-SHA512 at 300000 iterations: 48 bytes of output, split into
//! a 32-byte key and a 16-byte IV. The whole container travels as one
//! standard-base64 string, so external tooling can decrypt it with
//! `openssl enc -d -aes-256-cbc -pbkdf2 -md sha512 -iter 300000`.

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac_array;
use rand::Rng;
use rand::rand_core::UnwrapErr;
use rand::rngs::SysRng;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::armor;
use crate::error::{ErrorCategory, ErrorKind, OtsboxError, Result};

/// ASCII banner prefixing every container. Interoperability only; it
/// carries no security function and MUST be reproduced byte-for-byte.
const BANNER: &[u8; 8] = b"Salted__";

/// Length of salt in bytes
pub const SALT_LEN: usize = 8;

/// Length of the AES-256 key in bytes
const KEY_LEN: usize = 32;

/// Length of the CBC initialization vector in bytes
const IV_LEN: usize = 16;

/// Length of the derived key material (key + IV) in bytes
const DERIVED_LEN: usize = KEY_LEN + IV_LEN;

/// PBKDF2 iteration count
const PBKDF2_ROUNDS: u32 = 300_000;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Generate a cryptographically secure random 8-byte salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    UnwrapErr(SysRng).fill_bytes(&mut salt);
    salt
}

/// Derive the AES-256 key and CBC IV from a passphrase and salt
///
/// PBKDF2-HMAC-SHA512 with 300000 iterations produces 48 bytes; the first
/// 32 become the key, the remaining 16 the IV. Deterministic: the same
/// inputs always yield the same output, which is what makes decryption
/// possible. The salt must be the 8-byte value carried in the container.
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let derived = Zeroizing::new(pbkdf2_hmac_array::<Sha512, DERIVED_LEN>(
        passphrase.as_bytes(),
        salt,
        PBKDF2_ROUNDS,
    ));

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&derived[..KEY_LEN]);
    iv.copy_from_slice(&derived[KEY_LEN..]);

    (key, iv)
}

/// Encrypt plaintext with a passphrase using a fresh random salt
///
/// Returns the base64-encoded container: banner(8) + salt(8) + ciphertext.
/// The salt is drawn fresh on every call; identical inputs never produce
/// identical containers, and key/IV pairs are never reused.
pub fn encrypt(passphrase: &str, plaintext: &str) -> String {
    encrypt_with_salt(passphrase, plaintext, &generate_salt())
}

/// Encrypt plaintext with a passphrase and a caller-provided salt
///
/// This function is ONLY for tests and golden vectors that need
/// deterministic output. NEVER use this in production - always use
/// `encrypt()` which generates a random salt.
pub fn encrypt_with_salt(passphrase: &str, plaintext: &str, salt: &[u8; SALT_LEN]) -> String {
    let (key, iv) = derive_key(passphrase, salt);

    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut container = Vec::with_capacity(BANNER.len() + SALT_LEN + ciphertext.len());
    container.extend_from_slice(BANNER);
    container.extend_from_slice(salt);
    container.extend_from_slice(&ciphertext);

    armor::wrap(&container)
}

/// Decrypt a base64-encoded container produced by `encrypt`
///
/// The salt is read from bytes 8..16 of the decoded container and the
/// ciphertext from byte 16 onward. A wrong passphrase, a truncated or
/// tampered-with container, and invalid base64 all fail with the same
/// error; callers cannot tell the causes apart.
pub fn decrypt(passphrase: &str, container: &str) -> Result<String> {
    let data = armor::unwrap(container).map_err(|_| decryption_failed())?;

    if data.len() < BANNER.len() + SALT_LEN {
        return Err(decryption_failed());
    }

    let salt: [u8; SALT_LEN] = data[BANNER.len()..BANNER.len() + SALT_LEN]
        .try_into()
        .map_err(|_| decryption_failed())?;
    let ciphertext = &data[BANNER.len() + SALT_LEN..];

    let (key, iv) = derive_key(passphrase, &salt);

    let plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| decryption_failed())?;

    String::from_utf8(plaintext).map_err(|_| decryption_failed())
}

/// The single failure every decryption problem collapses into
fn decryption_failed() -> OtsboxError {
    OtsboxError::with_kind(
        ErrorCategory::User,
        ErrorKind::DecryptionFailed,
        "corrupt container, tampered-with data, or bad passphrase",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let passphrase = "test";
        let plaintext = "hello";

        let container = encrypt(passphrase, plaintext);
        let decrypted = decrypt(passphrase, &container).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_empty_plaintext() {
        let passphrase = "test";

        let container = encrypt(passphrase, "");
        let decrypted = decrypt(passphrase, &container).unwrap();

        assert_eq!("", decrypted);
    }

    #[test]
    fn test_unicode_plaintext() {
        let passphrase = "test";
        let plaintext = "secret 🔐 日本語";

        let container = encrypt(passphrase, plaintext);
        let decrypted = decrypt(passphrase, &container).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_salt_freshness() {
        let passphrase = "test";
        let plaintext = "hello world";

        let c1 = encrypt(passphrase, plaintext);
        let c2 = encrypt(passphrase, plaintext);

        // Random salt makes identical inputs produce distinct containers
        assert_ne!(c1, c2);

        assert_eq!(decrypt(passphrase, &c1).unwrap(), plaintext);
        assert_eq!(decrypt(passphrase, &c2).unwrap(), plaintext);
    }

    #[test]
    fn test_deterministic_encryption() {
        let passphrase = "test";
        let plaintext = "hello world";
        let salt = [1u8; SALT_LEN];

        let c1 = encrypt_with_salt(passphrase, plaintext, &salt);
        let c2 = encrypt_with_salt(passphrase, plaintext, &salt);

        assert_eq!(c1, c2);
        assert_eq!(decrypt(passphrase, &c1).unwrap(), plaintext);
    }

    /// The exact container for these inputs as produced by
    /// `openssl enc -aes-256-cbc -pbkdf2 -md sha512 -iter 300000`.
    #[test]
    fn test_openssl_compatibility() {
        let container = encrypt_with_salt("test", "hello world", &[1u8; SALT_LEN]);
        assert_eq!(container, "U2FsdGVkX18BAQEBAQEBATdGNd2Cb/jkzfYlajaZCAI=");

        let container = encrypt_with_salt("correct", "secret data", &[3u8; SALT_LEN]);
        assert_eq!(container, "U2FsdGVkX18DAwMDAwMDA47QX0VmiM+DFtejcPbqIdc=");
    }

    #[test]
    fn test_container_banner() {
        let container = encrypt("test", "hello");

        let decoded = armor::unwrap(&container).unwrap();
        assert_eq!(&decoded[..8], b"Salted__");

        // base64("Salted__") - visible without decoding
        assert!(container.starts_with("U2FsdGVk"));
    }

    #[test]
    fn test_wrong_passphrase() {
        // Fixed salts keep the outcomes reproducible run-to-run
        let pairs: [(&str, &str, [u8; SALT_LEN], &str); 3] = [
            ("correct", "wrong", [3u8; SALT_LEN], "secret data"),
            ("a", "b", [5u8; SALT_LEN], "x"),
            (
                "pfQ4x0uVZ8wmCLWs36Gj",
                "pfQ4x0uVZ8wmCLWs36Gk",
                [0xab; SALT_LEN],
                "almost the same passphrase",
            ),
        ];

        for (good, bad, salt, plaintext) in pairs {
            let container = encrypt_with_salt(good, plaintext, &salt);
            let err = decrypt(bad, &container).expect_err("expected decryption failure");

            assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
            assert_eq!(
                err.message(),
                "corrupt container, tampered-with data, or bad passphrase"
            );
        }
    }

    #[test]
    fn test_truncated_container() {
        // Valid base64, but too short to hold banner + salt
        let container = armor::wrap(&[0u8; 10]);
        let err = decrypt("test", &container).expect_err("expected decryption failure");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
    }

    #[test]
    fn test_invalid_base64() {
        let err = decrypt("test", "!!! not base64 !!!").expect_err("expected decryption failure");

        // Bad encoding is indistinguishable from a bad passphrase
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
        assert_eq!(
            err.message(),
            "corrupt container, tampered-with data, or bad passphrase"
        );
    }

    #[test]
    fn test_corrupted_ciphertext() {
        // Fixed salt keeps the outcome reproducible run-to-run
        let container = encrypt_with_salt("correct", "secret data", &[3u8; SALT_LEN]);
        let mut data = armor::unwrap(&container).unwrap();

        // Flip a bit in the last ciphertext byte to break the padding
        let last = data.len() - 1;
        data[last] ^= 0x01;

        let err =
            decrypt("correct", &armor::wrap(&data)).expect_err("expected decryption failure");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [7u8; SALT_LEN];

        let (k1, iv1) = derive_key("passphrase", &salt);
        let (k2, iv2) = derive_key("passphrase", &salt);

        assert_eq!(k1, k2);
        assert_eq!(iv1, iv2);

        // PBKDF2-HMAC-SHA512("passphrase", 07x8, 300000), 48 bytes, split 32+16
        assert_eq!(
            hex(&k1),
            "8e273362e377f261d3eaeb3f9eae715021442d4cea3e0030b6916db14ad28f70"
        );
        assert_eq!(hex(&iv1), "609ef0a3215f0129f0e59e64b020cbdf");
    }

    #[test]
    fn test_derive_key_inputs_matter() {
        let salt_a = [7u8; SALT_LEN];
        let salt_b = [8u8; SALT_LEN];

        let (k1, iv1) = derive_key("passphrase", &salt_a);
        let (k2, iv2) = derive_key("passphrase", &salt_b);
        let (k3, iv3) = derive_key("other", &salt_a);

        assert_ne!((k1, iv1), (k2, iv2));
        assert_ne!((k1, iv1), (k3, iv3));
    }
}
