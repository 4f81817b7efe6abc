//! GAOJIE backend API client.
//!
//! # Architecture
//!
//! - JSON over `reqwest`, one shared connection pool
//! - Every request has an explicit timeout (`BACKEND_TIMEOUT_SECS`)
//! - Catalog reads are cached in memory via `moka` (5 minute TTL)
//! - Auth and order calls carry the shopper's backend session cookie
//!
//! # Response envelope
//!
//! The backend answers `{"status": "success" | "error", "message": ..., ...}`.
//! A non-success HTTP status or an `"error"` status in a 2xx body becomes an
//! [`ApiError`] carrying the backend's message.

mod auth;
mod cache;
mod orders;
mod products;
pub mod types;

pub use auth::AuthSession;
pub use products::ProductCollection;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;
use cache::{CacheKey, CacheValue};

/// Errors from the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request exceeded the configured timeout.
    #[error("Backend request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response with `"status": "error"`.
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// 404 from the backend.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 401/403 from the backend.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Response body did not match the expected shape.
    #[error("Unexpected backend response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

impl ApiError {
    /// Message safe to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::Http(_) => {
                "Could not reach the server. Please check your connection and try again."
                    .to_string()
            }
            Self::Status { message, .. }
            | Self::Rejected(message)
            | Self::NotFound(message)
            | Self::Unauthorized(message) => message.clone(),
            Self::Parse(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

// =============================================================================
// BackendCredential
// =============================================================================

/// The shopper's backend session cookie.
///
/// Captured from `Set-Cookie` on login/register and replayed as `Cookie`.
#[derive(Clone)]
pub struct BackendCredential(SecretString);

impl std::fmt::Debug for BackendCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BackendCredential([REDACTED])")
    }
}

impl BackendCredential {
    /// Build from a stored `Cookie` header value.
    #[must_use]
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(SecretString::from(cookie.into()))
    }

    /// Collect `name=value` pairs from every `Set-Cookie` header.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.ends_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self::new(pairs.join("; ")))
        }
    }

    /// Value for the `Cookie` header.
    #[must_use]
    pub fn cookie(&self) -> &str {
        self.0.expose_secret()
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the GAOJIE backend API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base: Url,
    cache: Cache<CacheKey, CacheValue>,
}

/// A decoded response and its headers.
struct Reply {
    body: serde_json::Value,
    headers: HeaderMap,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Parse(format!("Invalid base URL: {}", self.inner.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode the JSON envelope.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        credential: Option<&BackendCredential>,
    ) -> Result<Reply, ApiError> {
        let request = match credential {
            Some(credential) => request.header(COOKIE, credential.cookie()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;
        let body: Option<serde_json::Value> = serde_json::from_str(&response_text).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(envelope_message)
                .unwrap_or_else(|| format!("HTTP {status}"));

            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Backend returned non-success status"
                );
            } else {
                tracing::debug!(status = %status, message = %message, "Backend refused request");
            }

            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let Some(body) = body else {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            return Err(ApiError::Parse("Response is not JSON".to_string()));
        };

        if body.get("status").and_then(serde_json::Value::as_str) == Some("error") {
            let message = envelope_message(&body).unwrap_or_else(|| "Request failed".to_string());
            return Err(ApiError::Rejected(message));
        }

        Ok(Reply { body, headers })
    }

    /// Send a request and deserialize the body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        credential: Option<&BackendCredential>,
    ) -> Result<T, ApiError> {
        let reply = self.dispatch(request, credential).await?;
        decode(reply.body)
    }
}

fn decode<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| {
        tracing::error!(error = %e, "Backend response has unexpected shape");
        ApiError::Parse(e.to_string())
    })
}

/// `message` (or `error`) of an envelope.
fn envelope_message(body: &serde_json::Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(serde_json::Value::as_str))
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client() -> ApiClient {
        ApiClient::new(&BackendConfig {
            api_url: Url::parse("http://localhost:5000/api/").unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = client().endpoint(&["products", "slug", "rose water"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/products/slug/rose%20water");
    }

    #[test]
    fn test_credential_from_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("session=abc123; HttpOnly; Path=/"),
        );
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("remember_token=xyz; Expires=Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        let credential = BackendCredential::from_headers(&headers).unwrap();
        assert_eq!(credential.cookie(), "session=abc123; remember_token=xyz");
        assert_eq!(format!("{credential:?}"), "BackendCredential([REDACTED])");
    }

    #[test]
    fn test_credential_ignores_cleared_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("session=; Max-Age=0"));
        assert!(BackendCredential::from_headers(&headers).is_none());
        assert!(BackendCredential::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_envelope_message() {
        let body = serde_json::json!({"status": "error", "message": "Invalid email or password"});
        assert_eq!(
            envelope_message(&body).as_deref(),
            Some("Invalid email or password")
        );
        let body = serde_json::json!({"error": "Bad request"});
        assert_eq!(envelope_message(&body).as_deref(), Some("Bad request"));
        assert!(envelope_message(&serde_json::json!({})).is_none());
    }

    #[test]
    fn test_user_messages() {
        assert!(ApiError::Timeout.user_message().contains("too long"));
        let err = ApiError::Status {
            status: 400,
            message: "Cart is empty".to_string(),
        };
        assert_eq!(err.user_message(), "Cart is empty");
    }
}
