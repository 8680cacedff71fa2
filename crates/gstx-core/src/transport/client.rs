//! Typed endpoint methods over a [`Transport`].

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{classify, ApiRequest, HttpTransport, RawResponse, Transport};
use crate::error::ApiError;
use crate::models::config::ApiConfig;
use crate::models::extraction::{
    ExtractResponse, ExtractionDetail, ExtractionId, ExtractionList, HealthReport, ServiceStats,
    TextExtractionRequest,
};
use crate::validate::UploadFile;

/// Client for the extraction API.
///
/// Every call goes through the same transport and the same classification
/// step. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient<T = HttpTransport> {
    transport: T,
}

impl ApiClient<HttpTransport> {
    /// Create a client talking HTTP to the configured service.
    pub fn from_config(config: &ApiConfig) -> crate::Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and classify the response.
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let method = request.method;
        let path = request.path();
        debug!("{} {}", method, path);

        let outcome = self.transport.send(request).await.and_then(classify);

        match &outcome {
            Ok(response) => debug!(
                "{} {} -> {} ({} bytes)",
                method,
                path,
                response.status,
                response.body.len()
            ),
            Err(e) => warn!("{} {} failed: {}", method, path, e),
        }

        outcome
    }

    async fn fetch_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let response = self.execute(request).await?;
        decode(&response)
    }

    /// `GET /health`. Any 2xx is healthy; the body is decoded when possible.
    pub async fn health(&self) -> Result<HealthReport, ApiError> {
        let response = self.execute(ApiRequest::get(&["health"])).await?;
        Ok(serde_json::from_slice(&response.body).unwrap_or_default())
    }

    /// `GET /stats`.
    pub async fn stats(&self) -> Result<ServiceStats, ApiError> {
        self.fetch_json(ApiRequest::get(&["stats"])).await
    }

    /// `POST /extract/image` with the file as multipart field `file`.
    pub async fn extract_image(&self, file: &UploadFile) -> Result<ExtractResponse, ApiError> {
        self.fetch_json(ApiRequest::post_multipart(&["extract", "image"], file.clone()))
            .await
    }

    /// `POST /extract/text` with `{"invoice_text": text}`.
    pub async fn extract_text(&self, text: &str) -> Result<ExtractResponse, ApiError> {
        let body = serde_json::to_value(TextExtractionRequest { invoice_text: text })
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.fetch_json(ApiRequest::post_json(&["extract", "text"], body))
            .await
    }

    /// `GET /extraction/{id}`.
    pub async fn extraction(&self, id: &ExtractionId) -> Result<ExtractionDetail, ApiError> {
        self.fetch_json(ApiRequest::get(&["extraction", id.as_str()]))
            .await
    }

    /// `GET /extractions`.
    pub async fn extractions(&self) -> Result<ExtractionList, ApiError> {
        self.fetch_json(ApiRequest::get(&["extractions"])).await
    }

    /// `DELETE /extraction/{id}`.
    pub async fn delete_extraction(&self, id: &ExtractionId) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(&["extraction", id.as_str()]))
            .await
            .map(|_| ())
    }

    /// `GET /extraction/{id}/download`, returned raw.
    pub async fn download_extraction(&self, id: &ExtractionId) -> Result<RawResponse, ApiError> {
        self.execute(ApiRequest::get(&["extraction", id.as_str(), "download"]))
            .await
    }
}

fn decode<R: DeserializeOwned>(response: &RawResponse) -> Result<R, ApiError> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
