//! BestGems analytics API client, the catalog and write target

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::{CatalogEntry, OwnersPayload, VersionsPayload};
use crate::client::{
    build_client, decode_json, endpoint, ensure_success, parse_base_url, transport_error,
    AuthConfig, HttpConfig,
};
use crate::traits::SinkClient;
use crate::RegistryResult;
use gemsync_core::{OwnerList, PackageInfo, PackageName, Page, VersionList};

/// Authenticated client for the BestGems v2 API
#[derive(Debug, Clone)]
pub struct BestGemsClient {
    /// Underlying HTTP client; carries the bearer token as a default header
    client: Client,
    base_url: Url,
}

impl BestGemsClient {
    /// Create a client from the base address and API key given on the command line
    pub fn new(base_url: &str, api_key: &str, http: &HttpConfig) -> RegistryResult<Self> {
        Ok(Self {
            client: build_client(http, Some(&AuthConfig::bearer(api_key)))?,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn gem_endpoint(&self, name: &PackageName, resource: &str) -> RegistryResult<Url> {
        endpoint(
            &self.base_url,
            &["api", "v2", "gems", name.as_str(), resource],
        )
    }

    async fn put_json<B>(&self, url: Url, body: &B) -> RegistryResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(url = %url, "writing to sink");

        let response = self
            .client
            .put(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error("PUT", &url, e))?;

        ensure_success("PUT", &url, response)?;
        Ok(())
    }
}

#[async_trait]
impl SinkClient for BestGemsClient {
    async fn list_page(&self, page: u32) -> RegistryResult<Page> {
        let mut url = endpoint(&self.base_url, &["api", "v2", "gems.json"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());

        debug!(url = %url, page, "listing sink catalog");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error("GET", &url, e))?;

        let response = ensure_success("GET", &url, response)?;
        let entries: Vec<CatalogEntry> = decode_json("catalog page", response).await?;

        Ok(Page::new(
            page,
            entries.into_iter().map(|entry| entry.name).collect(),
        ))
    }

    async fn put_detail(&self, info: &PackageInfo) -> RegistryResult<()> {
        let url = self.gem_endpoint(info.name(), "detail")?;
        self.put_json(url, info).await
    }

    async fn put_dependencies(&self, info: &PackageInfo) -> RegistryResult<()> {
        let url = self.gem_endpoint(info.name(), "dependencies")?;
        self.put_json(url, &info.dependency_record()).await
    }

    async fn put_versions(
        &self,
        name: &PackageName,
        versions: &VersionList,
    ) -> RegistryResult<()> {
        let url = self.gem_endpoint(name, "versions")?;
        self.put_json(url, &VersionsPayload { versions }).await
    }

    async fn put_owners(&self, name: &PackageName, owners: &OwnerList) -> RegistryResult<()> {
        let url = self.gem_endpoint(name, "owners")?;
        self.put_json(url, &OwnersPayload { owners }).await
    }
}
