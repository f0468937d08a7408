//! Upload validation.
//!
//! Files arrive from the browser's file picker with a MIME type and size.
//! Only `image/*` files within the configured ceiling may enter the
//! pipeline.

use thiserror::Error;

use crate::config::PipelineConfig;

/// A file selected by the customer, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name as reported by the browser
    pub name: String,
    /// MIME type as reported by the browser
    pub mime: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the MIME type is in the `image/*` family
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }
}

/// Input validation failures for uploads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("{name} is not an image ({mime})")]
    NotAnImage { name: String, mime: String },

    #[error("{name} is too large ({size} bytes). Please upload files smaller than {limit_mb}MB.")]
    FileTooLarge {
        name: String,
        size: usize,
        limit_mb: usize,
    },

    #[error("No image slots remaining")]
    NoCapacity,
}

/// True when `mime` is an `image/*` type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Validate a single upload against the MIME and size rules.
pub fn validate_upload(file: &UploadFile, config: &PipelineConfig) -> Result<(), UploadError> {
    if !file.is_image() {
        return Err(UploadError::NotAnImage {
            name: file.name.clone(),
            mime: file.mime.clone(),
        });
    }
    if file.size() > config.max_file_bytes {
        return Err(UploadError::FileTooLarge {
            name: file.name.clone(),
            size: file.size(),
            limit_mb: config.max_file_megabytes(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/jpeg"));
        assert!(is_image_mime("IMAGE/PNG"));
        assert!(is_image_mime("image/webp"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime("image"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn test_validate_accepts_image_within_limit() {
        let config = PipelineConfig::default();
        let file = UploadFile::new("a.jpg", "image/jpeg", vec![0; 1024]);
        assert_eq!(validate_upload(&file, &config), Ok(()));
    }

    #[test]
    fn test_validate_rejects_non_image() {
        let config = PipelineConfig::default();
        let file = UploadFile::new("notes.txt", "text/plain", vec![0; 10]);
        assert!(matches!(
            validate_upload(&file, &config),
            Err(UploadError::NotAnImage { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let config = PipelineConfig {
            max_file_bytes: 16,
            ..PipelineConfig::default()
        };
        let file = UploadFile::new("big.png", "image/png", vec![0; 17]);
        assert!(matches!(
            validate_upload(&file, &config),
            Err(UploadError::FileTooLarge { size: 17, .. })
        ));
    }

    #[test]
    fn test_limit_is_inclusive() {
        let config = PipelineConfig {
            max_file_bytes: 16,
            ..PipelineConfig::default()
        };
        let file = UploadFile::new("ok.png", "image/png", vec![0; 16]);
        assert_eq!(validate_upload(&file, &config), Ok(()));
    }

    #[test]
    fn test_too_large_message() {
        let err = UploadError::FileTooLarge {
            name: "big.jpg".into(),
            size: 11_000_000,
            limit_mb: 10,
        };
        assert_eq!(
            err.to_string(),
            "big.jpg is too large (11000000 bytes). Please upload files smaller than 10MB."
        );
    }
}
