//! Error conditions raised while crawling catalogs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// Transport, status or parse failure for a catalog document.
    #[error("Catalog unavailable at {url}: {reason}")]
    CatalogUnavailable { url: String, reason: String },

    #[error("Mission directory `{name}` is unparseable: {reason}")]
    MissionNameUnparseable { name: String, reason: String },

    #[error("Invalid address `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },
}

impl CrawlError {
    pub fn unavailable(url: impl ToString, reason: impl ToString) -> Self {
        CrawlError::CatalogUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unparseable(name: &str, reason: impl ToString) -> Self {
        CrawlError::MissionNameUnparseable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_address(address: &str, source: url::ParseError) -> Self {
        CrawlError::InvalidAddress {
            address: address.to_string(),
            source,
        }
    }
}

/// Platform registration produced no files. The orchestrator skips the
/// platform and carries on with the rest of the campaign.
#[derive(Debug, Error, PartialEq)]
#[error("No urls matching \"{pattern}\" found in {root}")]
pub struct NoDatasetsFound {
    pub pattern: String,
    pub root: String,
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_pattern_and_root_in_message() {
        let e = NoDatasetsFound {
            pattern: ".*10S_sci.nc$".to_string(),
            root: "http://example.org/thredds/catalog/x/catalog.xml".to_string(),
        };

        assert_eq!(
            e.to_string(),
            "No urls matching \".*10S_sci.nc$\" found in http://example.org/thredds/catalog/x/catalog.xml"
        );
    }

    #[test]
    fn should_keep_parse_error_as_source() {
        let source = url::Url::parse("not a url").unwrap_err();
        let e = CrawlError::invalid_address("not a url", source);

        assert!(std::error::Error::source(&e).is_some());
    }
}
