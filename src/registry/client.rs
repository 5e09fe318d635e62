//! Catalog client for the Harbor v2.0 API
//!
//! Every listing is paged with a fixed page size; a page shorter than the page
//! size ends the walk. HTTP is hidden behind [`CatalogTransport`] so the
//! paging logic can run against canned responses.

use crate::config::Credentials;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{MirrorError, Result};
use crate::registry::catalog::{Artifact, Catalog, Repository};
use crate::registry::encoding;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const PAGE_SIZE: usize = 100;

/// Performs a GET and returns the body of a successful response
#[async_trait::async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;
}

/// reqwest-backed transport with optional basic auth
pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait::async_trait]
impl CatalogTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url).header("Accept", "application/json");

        if !self.credentials.is_empty() {
            request = request.basic_auth(&self.credentials.username, Some(&self.credentials.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(HttpErrorHandler::handle_catalog_error(url, status, error_text.trim()));
        }

        response
            .text()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(url, &e))
    }
}

pub struct CatalogClientBuilder {
    address: String,
    credentials: Credentials,
    insecure: bool,
    timeout: Duration,
}

impl CatalogClientBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: Credentials::anonymous(),
            insecure: false,
            timeout: Duration::from_secs(crate::config::DEFAULT_CATALOG_TIMEOUT_SECS),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<CatalogClient<HttpTransport>> {
        let base = encoding::normalize_base(&self.address, self.insecure)?;

        let mut builder = Client::builder().timeout(self.timeout);
        if self.insecure {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let client = builder
            .build()
            .map_err(|e| MirrorError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(CatalogClient::new(base, HttpTransport::new(client, self.credentials)))
    }
}

pub struct CatalogClient<T = HttpTransport> {
    base: Url,
    transport: T,
    page_size: usize,
}

impl CatalogClient<HttpTransport> {
    pub fn builder(address: impl Into<String>) -> CatalogClientBuilder {
        CatalogClientBuilder::new(address)
    }
}

impl<T: CatalogTransport> CatalogClient<T> {
    pub fn new(base: Url, transport: T) -> Self {
        Self {
            base,
            transport,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn fetch_page<D: DeserializeOwned>(
        &self,
        endpoint: &Url,
        page: usize,
        with_tag: bool,
    ) -> Result<Vec<D>> {
        let url = encoding::page_url(endpoint, page, self.page_size, with_tag);
        let body = self.transport.get(url.as_str()).await?;

        // Harbor answers `null` for an empty page on some versions
        let items: Option<Vec<D>> = serde_json::from_str(&body).map_err(|e| {
            MirrorError::catalog(url.as_str(), None, format!("failed to decode response: {}", e))
        })?;
        Ok(items.unwrap_or_default())
    }

    /// Continue a walk whose first page has already been fetched
    async fn collect_pages<D: DeserializeOwned>(
        &self,
        endpoint: &Url,
        first: Vec<D>,
        with_tag: bool,
    ) -> Result<Vec<D>> {
        let mut page = 1;
        let mut chunk_len = first.len();
        let mut all = first;

        while chunk_len >= self.page_size {
            page += 1;
            let chunk: Vec<D> = self.fetch_page(endpoint, page, with_tag).await?;
            chunk_len = chunk.len();
            all.extend(chunk);
        }

        Ok(all)
    }

    async fn fetch_all<D: DeserializeOwned>(&self, endpoint: &Url, with_tag: bool) -> Result<Vec<D>> {
        let first = self.fetch_page(endpoint, 1, with_tag).await?;
        self.collect_pages(endpoint, first, with_tag).await
    }
}

#[async_trait::async_trait]
impl<T: CatalogTransport> Catalog for CatalogClient<T> {
    async fn list_repositories(&self, project: &str) -> Result<Vec<Repository>> {
        let endpoint = encoding::repositories_endpoint(&self.base, project)?;
        self.fetch_all(&endpoint, false).await
    }

    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>> {
        let candidates = encoding::artifact_endpoints(&self.base, project, repository)?;
        let mut last_error = None;

        for endpoint in &candidates {
            match self.fetch_page(endpoint, 1, true).await {
                Ok(first) => return self.collect_pages(endpoint, first, true).await,
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            MirrorError::catalog(self.base.as_str(), None, "no artifact endpoint to try")
        }))
    }
}
