//! Data URIs: a media type plus a base64 payload in one string.
//!
//! Images travel through the system as `data:<mime>;base64,<payload>` so they
//! can be embedded directly in an `<img src>` and carried inside JSON. The
//! generation service wants the bare payload, which is what
//! [`strip_data_uri_prefix`] returns.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI (missing `data:` scheme)")]
    MissingScheme,
    #[error("data URI is not base64-encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// A parsed `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    /// Wrap an already base64-encoded payload.
    pub fn new(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload without the prefix.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decode the payload back to bytes.
    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|e| DataUriError::InvalidPayload(e.to_string()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}{BASE64_MARKER}{}", self.mime_type, self.payload)
    }
}

impl FromStr for DataUri {
    type Err = DataUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(SCHEME).ok_or(DataUriError::MissingScheme)?;
        let (mime_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or(DataUriError::NotBase64)?;
        Ok(Self::new(mime_type, payload))
    }
}

/// Return only the base64 payload of a data URI.
///
/// Input without a `data:<mime>;base64,` prefix is returned unchanged, so the
/// function is idempotent.
pub fn strip_data_uri_prefix(s: &str) -> &str {
    match s.strip_prefix(SCHEME).and_then(|rest| rest.split_once(BASE64_MARKER)) {
        Some((_, payload)) => payload,
        None => s,
    }
}
