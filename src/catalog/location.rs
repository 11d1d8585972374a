//! Catalog addresses.

use std::fmt;

use url::Url;

use crate::error::CrawlError;

const CATALOG_DOCUMENT: &str = "catalog.xml";

/// A browse address and the machine-readable catalog document behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLocation {
    base: Url,
    document: Url,
}

impl CatalogLocation {
    /// Parses `base` and derives the catalog document address.
    ///
    /// `.../catalog.html` becomes `.../catalog.xml`, an `.xml` address is kept
    /// as is, and anything else is treated as a directory holding a
    /// `catalog.xml`.
    pub fn new(base: &str) -> Result<Self, CrawlError> {
        let base = Url::parse(base).map_err(|e| CrawlError::invalid_address(base, e))?;
        let document = document_address(&base)?;

        Ok(CatalogLocation { base, document })
    }

    pub fn from_url(url: Url) -> Result<Self, CrawlError> {
        let document = document_address(&url)?;

        Ok(CatalogLocation {
            base: url,
            document,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn document(&self) -> &Url {
        &self.document
    }
}

impl fmt::Display for CatalogLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document)
    }
}

fn document_address(base: &Url) -> Result<Url, CrawlError> {
    let path = base.path();

    if let Some(stem) = path.strip_suffix(".html") {
        let mut document = base.clone();
        document.set_path(&format!("{}.xml", stem));
        return Ok(document);
    }

    if path.ends_with(".xml") {
        return Ok(base.clone());
    }

    let mut directory = base.clone();
    if !path.ends_with('/') {
        directory.set_path(&format!("{}/", path));
    }

    directory
        .join(CATALOG_DOCUMENT)
        .map_err(|e| CrawlError::invalid_address(base.as_str(), e))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_append_catalog_to_directory() {
        let dir = "http://example.org/thredds/catalog/LRAUV/tethys/missionlogs/2016/";
        let l = CatalogLocation::new(dir).unwrap();

        assert_eq!(
            l.document().as_str(),
            "http://example.org/thredds/catalog/LRAUV/tethys/missionlogs/2016/catalog.xml"
        );
    }

    #[test]
    fn should_add_missing_trailing_slash() {
        let l = CatalogLocation::new("http://example.org/thredds/catalog/m1").unwrap();

        assert_eq!(
            l.document().as_str(),
            "http://example.org/thredds/catalog/m1/catalog.xml"
        );
    }

    #[test]
    fn should_rewrite_html_to_xml() {
        let l = CatalogLocation::new("http://example.org/thredds/catalog/m1/catalog.html").unwrap();

        assert_eq!(
            l.document().as_str(),
            "http://example.org/thredds/catalog/m1/catalog.xml"
        );
        assert_eq!(
            l.base().as_str(),
            "http://example.org/thredds/catalog/m1/catalog.html"
        );
    }

    #[test]
    fn should_keep_xml_document() {
        let l = CatalogLocation::new("http://example.org/thredds/catalog/m1/catalog.xml").unwrap();

        assert_eq!(l.document(), l.base());
    }

    #[test]
    fn should_reject_malformed_address() {
        let e = CatalogLocation::new("dodstemp/thredds").unwrap_err();

        assert!(matches!(e, CrawlError::InvalidAddress { .. }));
    }
}
