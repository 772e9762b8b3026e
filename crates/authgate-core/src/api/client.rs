//! Shared HTTP transport with bearer-token injection.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::Config;

use super::{ApiError, TransportError};

/// Standard response wrapper: `{"success": bool, "data": ..., "error": {...}}`
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap `data`, turning `success: false` into a rejection.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            let (code, message) = match self.error {
                Some(e) => (e.code, e.message.or(self.message)),
                None => (None, self.message),
            };
            return Err(ApiError::Rejected { code, message });
        }
        self.data
            .ok_or_else(|| ApiError::InvalidResponse("response has no data".to_string()))
    }
}

/// API client for the auth backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, tokens: TokenStore) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn from_config(config: &Config, tokens: TokenStore) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout(), tokens)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Bearer header from whatever token is stored right now, if any.
    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.tokens.get() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    /// Start a request to `path` with the auth header already attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .headers(self.auth_headers())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Send a prepared request and decode the JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let url = response.url().to_string();
        let response = Self::check_response(response).await?;

        // A response arrived, so a broken body is not a network failure
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read body from {}: {}", url, e)))?;
        debug!(url = %url, bytes = text.len(), "Response received");
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::from_status(status, &body).into())
        }
    }
}
