//! Base64 transcoding for images passed around as text
//!
//! Accepts both bare standard base64 and `data:image/...;base64,` URLs as
//! produced by browsers and generative-image APIs.

use crate::error::{MatteError, Result};
use base64::{engine::general_purpose, Engine as _};

const BASE64_MARKER: &str = ";base64,";

/// Service for base64 and data URL conversions
pub struct Base64Codec;

impl Base64Codec {
    /// Decode a base64 payload, stripping a `data:` URL prefix when present
    ///
    /// Surrounding whitespace and line breaks inside the payload are ignored.
    ///
    /// # Errors
    /// `Decode` for an empty payload, a `data:` URL without a base64 marker,
    /// or invalid base64.
    pub fn decode(data: &str) -> Result<Vec<u8>> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:") {
            let start = normalized
                .find(BASE64_MARKER)
                .ok_or_else(|| MatteError::decode("Data URL is missing the ';base64,' marker"))?;
            &normalized[start + BASE64_MARKER.len()..]
        } else {
            normalized
        };

        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if compact.is_empty() {
            return Err(MatteError::decode("Base64 payload is empty"));
        }

        general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| MatteError::decode(format!("Invalid base64: {}", e)))
    }

    /// Encode bytes as standard padded base64
    #[must_use]
    pub fn encode(bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }

    /// Wrap bytes in a `data:<mime>;base64,<payload>` URL
    #[must_use]
    pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
        format!("data:{}{}{}", mime, BASE64_MARKER, Self::encode(bytes))
    }
}
