//! Error types for the gstx-core library.

use thiserror::Error;

/// Main error type for the gstx library.
#[derive(Error, Debug)]
pub enum GstxError {
    /// Input rejected before any network call.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Remote call failed or was classified as an error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A submission is already in flight on this submitter.
    #[error("a submission is already in progress")]
    Busy,

    /// The extraction service answered but could not extract the invoice.
    #[error("extraction failed: {message}")]
    Extraction { message: String },

    /// The id is not part of the locally held collection.
    #[error("extraction {0} is not in the loaded history")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Reasons an input is refused before submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// MIME type outside the accepted image types.
    #[error("unsupported file type {mime_type}; expected one of JPG, PNG, BMP, TIFF, WEBP")]
    UnsupportedType { mime_type: String },

    /// File is larger than the upload limit.
    #[error("file is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    /// File has no content.
    #[error("file is empty")]
    EmptyFile,

    /// Text is empty or whitespace only.
    #[error("invoice text is empty")]
    EmptyText,
}

/// Classified outcome of a failed remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network failure or timeout; no response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// 503: the extraction engine is unreachable or overloaded.
    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    /// Any other 5xx.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 404 on a specific resource.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Other non-2xx answers such as 400 or 413.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Success status but the body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status attached to the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unavailable { .. } => Some(503),
            ApiError::Server { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }
}

/// Result type for the gstx library.
pub type Result<T> = std::result::Result<T, GstxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::Unavailable { message: "down".into() }.status(), Some(503));
        assert_eq!(ApiError::NotFound { message: "gone".into() }.status(), Some(404));
        assert_eq!(ApiError::Transport("timed out".into()).status(), None);
    }

    #[test]
    fn test_validation_error_wraps_into_gstx_error() {
        let err: GstxError = ValidationError::EmptyText.into();
        assert!(matches!(err, GstxError::Validation(ValidationError::EmptyText)));
        assert_eq!(err.to_string(), "invalid input: invoice text is empty");
    }
}
