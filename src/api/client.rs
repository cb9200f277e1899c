//! Backend HTTP client: base URL prefixing, JSON bodies, error translation.

use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Thin wrapper around `reqwest::Client` bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client with reqwest's default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with a per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self {
            base_url: normalize_base(base_url.into()),
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_timeout(&config.api_base_url, config.request_timeout)
    }

    /// The configured base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an absolute URL from path segments. Segments are percent-encoded,
    /// so ids containing `/` or spaces cannot escape their position.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Request(format!("invalid base URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Request(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue a request and decode the JSON response.
    ///
    /// Non-success statuses become [`ApiError::Http`] with the raw body text;
    /// transport failures become [`ApiError::Unreachable`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(method = %method, url = %url, "Backend request");

        let mut builder = self.client.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<serde_json::Value, ApiError> {
        self.request(Method::GET, &["health"], &[], None).await
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_builder() {
            return ApiError::Request(err.to_string());
        }
        ApiError::Unreachable {
            base_url: self.base_url.clone(),
            reason: err.to_string(),
        }
    }
}

fn normalize_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}
