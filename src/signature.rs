//! Drawn signatures, stored as `data:<mime>;base64,<payload>` URIs.
//!
//! The flow only checks that a signature is present. Decoding happens when a
//! signature is embedded into an exported form.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("Signature is not a data URI")]
    NotDataUri,

    #[error("Signature data URI is not base64 encoded")]
    NotBase64,

    #[error("Signature payload could not be decoded: {0}")]
    Decode(String),
}

/// An encoded signature as captured from the signature pad.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureBlob(String);

/// A decoded signature image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SignatureBlob {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Read a signature from a record value; blank strings and non-strings yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }

    pub fn decode(&self) -> Result<DecodedImage, SignatureError> {
        let rest = self
            .0
            .strip_prefix("data:")
            .ok_or(SignatureError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(SignatureError::NotDataUri)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(SignatureError::NotBase64)?;

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| SignatureError::Decode(e.to_string()))?;

        Ok(DecodedImage {
            mime: if mime.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime.to_string()
            },
            bytes,
        })
    }
}
