//! `data:` URL transport.
//!
//! Rendered images travel to the cart (and back, when a cart line is
//! edited) as `data:<mime>;base64,<payload>` strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::decode::DecodeError;

/// Build a base64 data URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
///
/// Only the `;base64` form is accepted; that is the only form the
/// storefront ever produces.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), DecodeError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| DecodeError::InvalidDataUrl("missing data: prefix".to_string()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| DecodeError::InvalidDataUrl("missing payload separator".to_string()))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| DecodeError::InvalidDataUrl("payload is not base64".to_string()))?;
    if mime.is_empty() {
        return Err(DecodeError::InvalidDataUrl("missing MIME type".to_string()));
    }

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| DecodeError::InvalidDataUrl(e.to_string()))?;

    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_data_url() {
        assert_eq!(to_data_url("image/jpeg", b"abc"), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_parse_data_url() {
        let (mime, bytes) = parse_data_url("data:image/png;base64,YWJj").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        assert!(matches!(
            parse_data_url("image/png;base64,YWJj"),
            Err(DecodeError::InvalidDataUrl(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_base64_form() {
        assert!(parse_data_url("data:text/plain,hello").is_err());
        assert!(parse_data_url("data:;base64,YWJj").is_err());
        assert!(parse_data_url("data:image/png;base64").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_payload() {
        assert!(parse_data_url("data:image/png;base64,***").is_err());
    }
}
