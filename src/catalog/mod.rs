//! Typed model of a THREDDS inventory catalog.

pub mod fetch;
pub mod location;
pub mod parse;

use std::future::Future;

use url::Url;

use crate::error::CrawlError;

pub use fetch::{fetch_catalog, HttpCatalogSource};
pub use location::CatalogLocation;
pub use parse::{parse_catalog, Namespaces};

/// Something that can hand back the raw text of a catalog document.
pub trait CatalogSource {
    fn fetch_text(&self, url: &Url) -> impl Future<Output = Result<String, CrawlError>>;
}

/// A parsed catalog document.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogNode {
    pub url: Url,
    pub name: Option<String>,
    pub services: Vec<Service>,
    pub references: Vec<CatalogRef>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub kind: String,
    pub base: String,
    /// Name of the enclosing compound service, if any.
    pub parent: Option<String>,
}

impl Service {
    pub fn is_compound(&self) -> bool {
        self.kind.eq_ignore_ascii_case("compound")
    }
}

/// A `catalogRef` entry pointing at another catalog document.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRef {
    pub title: String,
    pub href: String,
}

/// A leaf dataset, i.e. one with a `urlPath`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub id: Option<String>,
    pub url_path: String,
    pub service_name: Option<String>,
}

/// A resolved access address for a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetReference {
    pub url: Url,
    pub service_kind: String,
}

impl CatalogNode {
    pub fn new(url: Url) -> Self {
        CatalogNode {
            url,
            name: None,
            services: Vec::new(),
            references: Vec::new(),
            datasets: Vec::new(),
        }
    }

    /// Resolves a reference's `href` against this document.
    pub fn reference_url(&self, reference: &CatalogRef) -> Result<Url, CrawlError> {
        self.url
            .join(&reference.href)
            .map_err(|e| CrawlError::invalid_address(&reference.href, e))
    }

    /// Access addresses for `dataset`, one per concrete service it is
    /// published through.
    pub fn access_points(&self, dataset: &Dataset) -> Vec<DatasetReference> {
        self.services
            .iter()
            .filter(|s| !s.is_compound())
            .filter(|s| match &dataset.service_name {
                Some(name) => s.name == *name || s.parent.as_deref() == Some(name.as_str()),
                None => true,
            })
            .filter_map(|s| {
                let address = format!("{}{}", s.base, dataset.url_path);
                match self.url.join(&address) {
                    Ok(url) => Some(DatasetReference {
                        url,
                        service_kind: s.kind.clone(),
                    }),
                    Err(e) => {
                        tracing::warn!(
                            address = %address,
                            error = %e,
                            "Skipping unresolvable access point"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}


// -- Tests -------------------------------------------------------------------
