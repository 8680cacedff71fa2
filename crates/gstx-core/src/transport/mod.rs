//! HTTP transport for the extraction API.
//!
//! [`Transport`] is the seam every workflow talks through: it moves one
//! [`ApiRequest`] to the service and hands back the [`RawResponse`] without
//! judging it. [`classify`] then turns non-2xx answers into [`ApiError`]s,
//! and [`ApiClient`] exposes one typed method per endpoint on top of both.

mod client;
mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use client::ApiClient;
pub use http::HttpTransport;

use std::fmt;
use std::future::Future;

use reqwest::StatusCode;

use crate::error::ApiError;
use crate::validate::UploadFile;

/// HTTP methods used by the extraction API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Request body encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document (the default encoding).
    Json(serde_json::Value),
    /// Multipart form with the file under the `file` field.
    Multipart(UploadFile),
}

/// One request to the extraction API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path segments relative to the base URL, unencoded.
    pub segments: Vec<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str], body: RequestBody) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            body,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::Get, segments, RequestBody::Empty)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::Delete, segments, RequestBody::Empty)
    }

    pub fn post_json(segments: &[&str], body: serde_json::Value) -> Self {
        Self::new(Method::Post, segments, RequestBody::Json(body))
    }

    pub fn post_multipart(segments: &[&str], file: UploadFile) -> Self {
        Self::new(Method::Post, segments, RequestBody::Multipart(file))
    }

    /// Path relative to the base URL, e.g. `/extraction/abc`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// An unclassified response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Value of the `content-disposition` header, if sent.
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_disposition: None,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn with_content_disposition(mut self, value: impl Into<String>) -> Self {
        self.content_disposition = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best human-readable message carried by an error response.
    ///
    /// Looks for a structured `detail` or `message` field, then any short
    /// plain-text body, then the status reason phrase.
    pub fn error_message(&self) -> String {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            if let Some(message) = structured_message(&json) {
                return message;
            }
        } else if let Ok(text) = std::str::from_utf8(&self.body) {
            let text = text.trim();
            if !text.is_empty() && text.len() <= 200 && !text.starts_with('<') {
                return text.to_string();
            }
        }

        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

fn structured_message(json: &serde_json::Value) -> Option<String> {
    let detail = json.get("detail");
    if let Some(text) = detail.and_then(|d| d.as_str()) {
        return Some(text.to_string());
    }
    // Request-validation failures carry a list of `{loc, msg}` entries.
    if let Some(text) = detail
        .and_then(|d| d.as_array())
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("msg"))
        .and_then(|msg| msg.as_str())
    {
        return Some(text.to_string());
    }
    json.get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Moves requests to the extraction service.
///
/// Implementations return `Err` only when no response was received; every
/// received response, whatever its status, is returned as `Ok`.
pub trait Transport {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, ApiError>> + Send;
}

/// Map a response to success or a classified error.
pub fn classify(response: RawResponse) -> Result<RawResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status;
    let message = response.error_message();

    Err(match status {
        503 => ApiError::Unavailable { message },
        404 => ApiError::NotFound { message },
        500..=599 => ApiError::Server { status, message },
        _ => ApiError::Rejected { status, message },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_classify_success() {
        for status in [200, 201, 204] {
            assert!(classify(RawResponse::new(status, "")).is_ok());
        }
    }

    #[test]
    fn test_classify_unavailable() {
        let response = RawResponse::json(
            503,
            &json!({"detail": "GST Invoice Extractor service is not available. Check API configuration."}),
        );
        assert_eq!(
            classify(response),
            Err(ApiError::Unavailable {
                message: "GST Invoice Extractor service is not available. Check API configuration."
                    .to_string()
            })
        );
    }

    #[test]
    fn test_classify_server_and_not_found() {
        let server = classify(RawResponse::json(500, &json!({"message": "Internal server error"})));
        assert_eq!(
            server,
            Err(ApiError::Server {
                status: 500,
                message: "Internal server error".to_string()
            })
        );

        let gateway = classify(RawResponse::new(502, ""));
        assert_eq!(
            gateway,
            Err(ApiError::Server {
                status: 502,
                message: "Bad Gateway".to_string()
            })
        );

        let missing = classify(RawResponse::json(404, &json!({"detail": "Extraction ID not found"})));
        assert_eq!(
            missing,
            Err(ApiError::NotFound {
                message: "Extraction ID not found".to_string()
            })
        );
    }

    #[test]
    fn test_classify_rejected() {
        let too_large = classify(RawResponse::json(
            413,
            &json!({"detail": "File size too large. Maximum size is 10MB"}),
        ));
        assert_eq!(
            too_large,
            Err(ApiError::Rejected {
                status: 413,
                message: "File size too large. Maximum size is 10MB".to_string()
            })
        );
    }

    #[test]
    fn test_error_message_validation_list() {
        let response = RawResponse::json(
            422,
            &json!({"detail": [{"loc": ["body", "invoice_text"], "msg": "field required"}]}),
        );
        assert_eq!(response.error_message(), "field required");
    }

    #[test]
    fn test_error_message_plain_text_and_html() {
        assert_eq!(RawResponse::new(500, "upstream exploded").error_message(), "upstream exploded");
        assert_eq!(
            RawResponse::new(502, "<html><body>nginx</body></html>").error_message(),
            "Bad Gateway"
        );
    }

    #[test]
    fn test_request_path() {
        let request = ApiRequest::get(&["extraction", "extract_1a2b_17", "download"]);
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path(), "/extraction/extract_1a2b_17/download");
    }
}
