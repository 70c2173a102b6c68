//! # Upload Module
//!
//! Size validation for uploaded photos and the data-URI codec used to move
//! images between the scan screen, session storage and the API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest accepted upload, in bytes (3 MiB).
pub const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Errors from upload validation and data-URI handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The file is larger than [`MAX_UPLOAD_BYTES`].
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// The string is not a `data:` URI.
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
}

/// Reject uploads larger than [`MAX_UPLOAD_BYTES`].
///
/// Runs before any detection attempt; a file of exactly the limit passes.
pub fn check_upload_size(size: usize) -> Result<(), UploadError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

// =============================================================================
// DATA URI
// =============================================================================

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    #[must_use]
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Render as `data:<mime>;base64,<payload>`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Parse a data URI.
    ///
    /// Accepts both the base64 form and the percent-encoded form. A missing
    /// media type defaults to `text/plain`.
    pub fn parse(uri: &str) -> Result<Self, UploadError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| UploadError::MalformedDataUri("missing 'data:' prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| UploadError::MalformedDataUri("missing ',' separator".into()))?;

        let mut params = header.split(';');
        let mime = match params.next() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => String::from("text/plain"),
        };
        let is_base64 = params.any(|p| p == "base64");

        let bytes = if is_base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| UploadError::MalformedDataUri(e.to_string()))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Ok(Self { mime, bytes })
    }

    /// Size of the decoded payload.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
