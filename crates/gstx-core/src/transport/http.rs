//! `reqwest`-backed transport.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::trace;

use super::{ApiRequest, Method, RawResponse, RequestBody, Transport};
use crate::error::{ApiError, GstxError};
use crate::models::config::ApiConfig;

/// Transport bound to one base URL with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from the API configuration.
    pub fn new(config: &ApiConfig) -> crate::Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            GstxError::Config(format!("invalid API base URL {:?}: {}", config.base_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(GstxError::Config(format!(
                "API base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| GstxError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
        })
    }

    /// Base URL every request path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ApiError::Transport(format!("cannot build a URL from {}", self.base_url))
            })?;
            segments.pop_if_empty().extend(request.segments.iter());
        }
        Ok(url)
    }

    fn transport_error(&self, url: &Url, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Transport(format!(
                "request to {} timed out after {}s",
                url,
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            ApiError::Transport(format!("could not connect to {}", url))
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let url = self.url_for(&request)?;
        trace!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        };

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(file) => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)
                    .map_err(|e| ApiError::Transport(format!("invalid content type: {}", e)))?;
                builder.multipart(Form::new().part("file", part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status().as_u16();
        let content_disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&url, e))?
            .to_vec();

        Ok(RawResponse {
            status,
            content_disposition,
            body,
        })
    }
}
