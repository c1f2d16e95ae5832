//! Media payload decoding.
//!
//! Media events carry a data-URI style payload: `"<mime>;base64,<data>"`.
//! The MIME prefix maps to a file extension via a fixed allowlist; anything
//! unrecognized falls back to a generic binary extension and is stored
//! anyway.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

/// MIME type -> file extension allowlist.
const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
];

/// Extension for MIME types outside the allowlist.
pub const FALLBACK_EXTENSION: &str = ".bin";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media payload is missing the ';base64,' separator")]
    MissingSeparator,

    #[error("media payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded media payload, ready to hand to blob storage.
#[derive(Debug)]
pub struct DecodedMedia {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Map a MIME type to a file extension.
pub fn extension_for(mime: &str) -> &'static str {
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == mime)
        .map(|(_, ext)| *ext)
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Split and decode a `"<mime>;base64,<data>"` payload.
pub fn decode_data_uri(payload: &str) -> Result<DecodedMedia, MediaError> {
    let (mime, data) = payload
        .split_once(";base64,")
        .ok_or(MediaError::MissingSeparator)?;

    let bytes = BASE64.decode(data)?;

    Ok(DecodedMedia {
        extension: extension_for(mime),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(extension_for("image/jpeg"), ".jpg");
        assert_eq!(extension_for("image/png"), ".png");
        assert_eq!(extension_for("image/gif"), ".gif");
        assert_eq!(extension_for("video/mp4"), ".mp4");
        assert_eq!(extension_for("video/webm"), ".webm");
    }

    #[test]
    fn unknown_mime_falls_back() {
        assert_eq!(extension_for("application/pdf"), ".bin");
        assert_eq!(extension_for(""), ".bin");
    }

    #[test]
    fn decode_png_payload() {
        let payload = format!("image/png;base64,{}", BASE64.encode(b"fake-png-bytes"));
        let decoded = decode_data_uri(&payload).unwrap();
        assert_eq!(decoded.extension, ".png");
        assert_eq!(decoded.bytes, b"fake-png-bytes");
    }

    #[test]
    fn decode_unknown_mime_still_succeeds() {
        let payload = format!("application/x-thing;base64,{}", BASE64.encode(b"blob"));
        let decoded = decode_data_uri(&payload).unwrap();
        assert_eq!(decoded.extension, ".bin");
        assert_eq!(decoded.bytes, b"blob");
    }

    #[test]
    fn missing_separator_is_an_error() {
        assert!(matches!(
            decode_data_uri("image/png:AAAA"),
            Err(MediaError::MissingSeparator)
        ));
    }

    #[test]
    fn invalid_base64_is_an_error() {
        assert!(matches!(
            decode_data_uri("image/png;base64,@@not-base64@@"),
            Err(MediaError::Base64(_))
        ));
    }
}
