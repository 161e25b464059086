//! RubyGems registry client, the source of package metadata

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::client::{
    build_client, decode_json, endpoint, ensure_success, parse_base_url, transport_error,
    HttpConfig,
};
use crate::traits::SourceClient;
use crate::RegistryResult;
use gemsync_core::{OwnerList, PackageInfo, PackageName, VersionList};

/// Public RubyGems API
pub const DEFAULT_SOURCE_URL: &str = "https://rubygems.org";

/// Read-only client for the RubyGems v1 API
#[derive(Debug, Clone)]
pub struct RubyGemsClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Base registry URL
    base_url: Url,
}

impl RubyGemsClient {
    /// Create a client for the public registry with default transport settings
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(DEFAULT_SOURCE_URL, &HttpConfig::default())
    }

    /// Create a client for a custom registry mirror
    pub fn with_config(base_url: &str, http: &HttpConfig) -> RegistryResult<Self> {
        Ok(Self {
            client: build_client(http, None)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET a JSON document, mapping 404 to `None`
    async fn get_optional<T: DeserializeOwned>(
        &self,
        what: &str,
        url: Url,
    ) -> RegistryResult<Option<T>> {
        debug!(url = %url, what, "fetching from source registry");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error("GET", &url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success("GET", &url, response)?;
        decode_json(what, response).await.map(Some)
    }
}

#[async_trait]
impl SourceClient for RubyGemsClient {
    async fn fetch_info(&self, name: &PackageName) -> RegistryResult<Option<PackageInfo>> {
        let file = format!("{}.json", name);
        let url = endpoint(&self.base_url, &["api", "v1", "gems", &file])?;
        self.get_optional("package info", url).await
    }

    async fn fetch_versions(&self, name: &PackageName) -> RegistryResult<Option<VersionList>> {
        let file = format!("{}.json", name);
        let url = endpoint(&self.base_url, &["api", "v1", "versions", &file])?;
        self.get_optional("versions", url).await
    }

    async fn fetch_owners(&self, name: &PackageName) -> RegistryResult<Option<OwnerList>> {
        let url = endpoint(
            &self.base_url,
            &["api", "v1", "gems", name.as_str(), "owners.json"],
        )?;
        self.get_optional("owners", url).await
    }
}
