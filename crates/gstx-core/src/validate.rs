//! Input validation run before anything is submitted.
//!
//! Both checks are pure: they never touch the network and never stage
//! anything. A rejected file is simply not handed to the submitter.

use std::path::Path;

use image::ImageFormat;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::config::UploadConfig;

/// MIME type used when a file's type cannot be determined.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// A file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent in the multipart body.
    pub file_name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a local file, deriving its MIME type from the extension and
    /// falling back to the content's magic bytes.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("invoice")
            .to_string();

        let mime_type = detect_mime_type(path, &bytes);
        debug!("Staged {} as {} ({} bytes)", file_name, mime_type, bytes.len());

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Determine the MIME type of a local file.
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> String {
    ImageFormat::from_path(path)
        .or_else(|_| image::guess_format(bytes))
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MIME_TYPE.to_string())
}

/// Validator bound to a set of upload limits.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: UploadConfig,
}

impl Validator {
    pub fn new(limits: UploadConfig) -> Self {
        Self { limits }
    }

    /// Check a file's type and size.
    pub fn validate_file(&self, file: &UploadFile) -> Result<(), ValidationError> {
        let mime_type = normalize_mime(&file.mime_type);
        let allowed = self
            .limits
            .allowed_mime_types
            .iter()
            .any(|m| normalize_mime(m) == mime_type);

        if !allowed {
            return Err(ValidationError::UnsupportedType {
                mime_type: file.mime_type.clone(),
            });
        }

        if file.size() > self.limits.max_file_size {
            return Err(ValidationError::TooLarge {
                size: file.size(),
                max: self.limits.max_file_size,
            });
        }

        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }

        Ok(())
    }

    /// Predicate form of [`Validator::validate_file`].
    pub fn is_valid_file(&self, file: &UploadFile) -> bool {
        self.validate_file(file).is_ok()
    }

    /// Check that text has non-whitespace content.
    pub fn validate_text(&self, text: &str) -> Result<(), ValidationError> {
        validate_text(text)
    }
}

/// Check a file against the default limits.
pub fn validate_file(file: &UploadFile) -> Result<(), ValidationError> {
    Validator::default().validate_file(file)
}

/// Check that text has non-whitespace content.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(())
}

/// Predicate form of [`validate_text`].
pub fn is_valid_text(text: &str) -> bool {
    validate_text(text).is_ok()
}

fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
