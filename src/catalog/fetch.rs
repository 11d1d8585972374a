//! Retrieves catalog documents over HTTP.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::{parse_catalog, CatalogLocation, CatalogNode, CatalogSource, Namespaces};
use crate::error::CrawlError;

const USER_AGENT: &str = concat!("campaign-crawler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
}

impl HttpCatalogSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(HttpCatalogSource { client })
    }
}

impl CatalogSource for HttpCatalogSource {
    async fn fetch_text(&self, url: &Url) -> Result<String, CrawlError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CrawlError::unavailable(url, e))?;

        if !response.status().is_success() {
            return Err(CrawlError::unavailable(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        response.text().await.map_err(|e| CrawlError::unavailable(url, e))
    }
}

/// Fetches and parses the catalog document at `location`.
pub async fn fetch_catalog<S: CatalogSource>(
    source: &S,
    location: &CatalogLocation,
    namespaces: &Namespaces,
) -> Result<CatalogNode, CrawlError> {
    tracing::debug!(url = %location.document(), requested = %location.base(), "Crawling");

    let xml = source.fetch_text(location.document()).await?;
    let node = parse_catalog(&xml, location.document().clone(), namespaces)?;

    tracing::debug!(
        catalog = node.name.as_deref().unwrap_or_default(),
        references = node.references.len(),
        datasets = node.datasets.len(),
        "Parsed catalog"
    );
    Ok(node)
}

// -- Tests -------------------------------------------------------------------
