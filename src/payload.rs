//! Payload packing: secret text plus attachments in one string
//!
//! A payload bundles the secret text with zero or more binary attachments
//! into the single plaintext string the envelope encrypts. Two wire forms
//! exist:
//!
//! - bare: the whole string is the secret, no attachments (the form that
//!   predates attachment support)
//! - tagged: the literal `OTSMeta` followed by a JSON object carrying the
//!   secret, a format version, and the attachments with base64 data
//!
//! Packing a payload without attachments falls back to the bare form so
//! older readers keep working. This module has no dependency on the
//! encryption envelope; see [`crate::secret`] for the composition.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::armor;
use crate::error::{ErrorCategory, ErrorKind, OtsboxError, Result};

/// Marker prefixing the tagged wire form
const META_MARKER: &str = "OTSMeta";

/// Format version written into tagged payloads. Parsed payloads keep
/// whatever version they declare; nothing branches on it yet.
const FORMAT_VERSION: u32 = 1;

/// A named binary file travelling alongside the secret text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    mime: String,
    content: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from its parts
    ///
    /// The name is shown to the recipient and should be the file name on
    /// the source system; it is not validated or deduplicated. The mime
    /// type may be an empty string.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            content,
        }
    }

    /// Creates an attachment from a file on disk
    ///
    /// The attachment is named after the file's base name and carries an
    /// empty mime type; use [`Attachment::new`] when the type is known.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|e| {
            OtsboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("reading attachment {}", path.display()),
                e,
            )
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            mime: String::new(),
            content,
        })
    }

    /// File name shown to the recipient
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type, possibly empty
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Raw file bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// A secret text plus its ordered attachments
///
/// Opaque value type: build with [`Payload::new`] or
/// [`Payload::with_attachments`], inspect through the accessors, and
/// convert to/from the wire string with [`Payload::pack`] and
/// [`Payload::unpack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    secret: String,
    version: u32,
    attachments: Vec<Attachment>,
}

/// Which of the two wire forms a raw string is in, decided once before
/// any parsing happens.
enum PayloadForm<'a> {
    /// The whole string is the secret
    Bare(&'a str),
    /// Tagged JSON body with the marker already stripped
    Tagged(&'a str),
}

fn classify(raw: &str) -> PayloadForm<'_> {
    match raw.strip_prefix(META_MARKER) {
        Some(body) => PayloadForm::Tagged(body),
        None => PayloadForm::Bare(raw),
    }
}

/// JSON shape of the tagged form. Field order here is the order written
/// to the wire.
#[derive(Serialize, Deserialize)]
struct WirePayload {
    #[serde(default)]
    secret: String,
    #[serde(default = "default_version")]
    v: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<WireAttachment>,
}

#[derive(Serialize, Deserialize)]
struct WireAttachment {
    data: String,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    mime: String,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl Payload {
    /// Creates a payload holding only a secret text
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            version: FORMAT_VERSION,
            attachments: Vec::new(),
        }
    }

    /// Creates a payload holding a secret text and its attachments
    pub fn with_attachments(secret: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            secret: secret.into(),
            version: FORMAT_VERSION,
            attachments,
        }
    }

    /// The secret text; may be empty when attachments are present
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = secret.into();
    }

    /// The format version carried by the payload
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Attachments in their original order
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Appends an attachment, preserving insertion order
    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Serializes the payload into its wire string
    ///
    /// Without attachments the output is the bare secret itself, so
    /// readers that predate attachment support still understand it.
    pub fn pack(&self) -> Result<String> {
        if self.attachments.is_empty() {
            return Ok(self.secret.clone());
        }

        let wire = WirePayload {
            secret: self.secret.clone(),
            v: self.version,
            attachments: self
                .attachments
                .iter()
                .map(|a| WireAttachment {
                    data: armor::wrap(&a.content),
                    name: a.name.clone(),
                    mime: a.mime.clone(),
                })
                .collect(),
        };

        let body = serde_json::to_string(&wire).map_err(|e| {
            OtsboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PayloadEncode,
                format!("encoding JSON payload: {}", e),
                e,
            )
        })?;

        Ok(format!("{}{}", META_MARKER, body))
    }

    /// Parses a wire string back into a payload
    ///
    /// A string without the `OTSMeta` marker is taken verbatim as a
    /// secret with no attachments. A marked string whose body does not
    /// parse fails with [`ErrorKind::MalformedPayload`].
    pub fn unpack(raw: &str) -> Result<Self> {
        let body = match classify(raw) {
            PayloadForm::Bare(secret) => return Ok(Self::new(secret)),
            PayloadForm::Tagged(body) => body,
        };

        let wire: WirePayload = serde_json::from_str(body).map_err(|e| {
            OtsboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::MalformedPayload,
                format!("decoding JSON payload: {}", e),
                e,
            )
        })?;

        let mut attachments = Vec::with_capacity(wire.attachments.len());
        for (i, a) in wire.attachments.into_iter().enumerate() {
            let content = armor::unwrap(&a.data).map_err(|e| {
                OtsboxError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::MalformedPayload,
                    format!("decoding attachment {}: invalid base64 data", i),
                    e,
                )
            })?;

            attachments.push(Attachment {
                name: a.name,
                mime: a.mime,
                content,
            });
        }

        Ok(Self {
            secret: wire.secret,
            version: wire.v,
            attachments,
        })
    }
}
