//! HTTP client construction with connection pooling, plus URL and response helpers

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::RegistryResult;
use gemsync_core::error::SyncError;

/// Transport settings shared by both API clients
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("gemsync/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 8,
        }
    }
}

/// Authentication configuration for API access
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Bearer token for authentication
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

/// Build a pooled client, attaching the bearer token to every request when given
pub fn build_client(http: &HttpConfig, auth: Option<&AuthConfig>) -> RegistryResult<Client> {
    let mut builder = ClientBuilder::new()
        // Connection pooling configuration
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(http.timeout)
        .gzip(true)
        .user_agent(http.user_agent.clone());

    if let Some(token) = auth.and_then(|auth| auth.token.as_deref()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            SyncError::ConfigValidation {
                field: "api_key".to_string(),
                reason: format!("Invalid auth token: {}", e),
            }
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| SyncError::network(format!("Failed to create HTTP client: {}", e), e))
}

/// Parse an absolute http(s) base URL
pub fn parse_base_url(raw: &str) -> RegistryResult<Url> {
    let invalid = |reason: String| SyncError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }

    Ok(url)
}

/// Append path segments to `base`, percent-encoding each one
pub fn endpoint(base: &Url, segments: &[&str]) -> RegistryResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SyncError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn transport_error(method: &str, url: &Url, error: reqwest::Error) -> SyncError {
    SyncError::network(format!("{} {} failed: {}", method, url, error), error)
}

/// Turn any non-2xx response into [`SyncError::HttpStatus`]
pub(crate) fn ensure_success(
    method: &str,
    url: &Url,
    response: Response,
) -> RegistryResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::HttpStatus {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    what: &str,
    response: Response,
) -> RegistryResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| SyncError::network(format!("Failed to read {} body: {}", what, e), e))?;

    serde_json::from_slice(&bytes).map_err(|e| SyncError::Decode {
        what: what.to_string(),
        message: e.to_string(),
    })
}
