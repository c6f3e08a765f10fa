//! otsbox - client-side core for one-time secret sharing
//!
//! Encrypts a secret (text plus optional file attachments) on the sender's
//! machine so the server that stores it only ever sees an opaque container.
//! Two building blocks:
//!
//! - [`payload`] packs text + attachments into one string (the `OTSMeta`
//!   format) and unpacks it again, falling back transparently to "the whole
//!   string is the secret" for payloads that predate attachments
//! - [`envelope`] encrypts that string under a passphrase into an
//!   OpenSSL-compatible base64 container (PBKDF2-SHA512 + AES-256-CBC)
//!
//! [`secret`] composes the two for the usual seal/open flow, and
//! [`passphrase`] generates the random passphrases that end up in share
//! link fragments.

#![forbid(unsafe_code)]

pub mod armor;
pub mod envelope;
pub mod error;
pub mod passphrase;
pub mod payload;
pub mod secret;
