//! Dataset selection inside a mission's sub-catalog.

use std::{
    collections::{HashSet, VecDeque},
    fmt,
    str::FromStr,
};

use anyhow::{Context, Error, Result};
use regex::Regex;
use url::Url;

use crate::{
    catalog::{
        fetch_catalog, CatalogLocation, CatalogRef, CatalogSource, Dataset, DatasetReference,
        Namespaces,
    },
    error::CrawlError,
    mission::MissionDirectory,
};

/// The only service kind whose addresses are handed to the loader.
pub const ACCESS_SERVICE: &str = "opendap";

/// Default exclusions for THREDDS aggregation and listing pages.
pub const DEFAULT_SKIPS: [&str; 6] = [
    ".*files.*",
    ".*Individual Files.*",
    ".*File_Access.*",
    ".*Forecast Model Run.*",
    ".*Constant Forecast Offset.*",
    ".*Constant Forecast Date.*",
];

/// A filename pattern.
///
/// Regular expressions are anchored at the start of the name, so
/// `.*10S_sci.nc$` selects names ending in `10S_sci.nc`. Shell globs such as
/// `*10S_sci.nc` are recognised by a leading `*` or `?`, by failing to compile
/// as a regex, or explicitly by a `glob:` prefix.
#[derive(Debug, Clone)]
pub enum FilePattern {
    Regex { source: String, regex: Regex },
    Glob(glob::Pattern),
}

impl FilePattern {
    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern))
            .with_context(|| format!("Invalid pattern `{}`", pattern))?;

        Ok(FilePattern::Regex {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        let glob =
            glob::Pattern::new(pattern).with_context(|| format!("Invalid glob `{}`", pattern))?;

        Ok(FilePattern::Glob(glob))
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            FilePattern::Regex { regex, .. } => regex.is_match(name),
            FilePattern::Glob(glob) => glob.matches(name),
        }
    }
}

impl FromStr for FilePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(glob) = s.strip_prefix("glob:") {
            return FilePattern::glob(glob);
        }
        if s.starts_with(['*', '?']) {
            return FilePattern::glob(s);
        }

        // Not a regex: try a glob, keeping the regex error if that fails too.
        FilePattern::regex(s).or_else(|e| FilePattern::glob(s).map_err(|_| e))
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilePattern::Regex { source, .. } => write!(f, "{}", source),
            FilePattern::Glob(glob) => write!(f, "glob:{}", glob.as_str()),
        }
    }
}

/// Patterns that disqualify a dataset or catalog reference outright.
#[derive(Debug, Clone)]
pub struct SkipPatternSet {
    patterns: Vec<FilePattern>,
}

impl SkipPatternSet {
    /// The default exclusions followed by `extra`.
    pub fn with_defaults<S: AsRef<str>>(extra: &[S]) -> Result<Self> {
        let mut patterns = DEFAULT_SKIPS
            .iter()
            .map(|p| FilePattern::from_str(p))
            .collect::<Result<Vec<_>>>()?;
        for pattern in extra {
            patterns.push(pattern.as_ref().parse()?);
        }

        Ok(SkipPatternSet { patterns })
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        SkipPatternSet { patterns: Vec::new() }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(candidate))
    }

    /// Skips apply to the dataset name only, never to its path.
    pub fn skips_dataset(&self, dataset: &Dataset) -> bool {
        self.is_match(&dataset.name)
    }

    pub fn skips_reference(&self, reference: &CatalogRef) -> bool {
        self.is_match(&reference.title)
    }
}

/// Crawls mission sub-catalogs for datasets matching an inclusion pattern.
pub struct DatasetSelector<'a, S> {
    source: &'a S,
    include: &'a FilePattern,
    skips: &'a SkipPatternSet,
    namespaces: &'a Namespaces,
}

impl<'a, S: CatalogSource> DatasetSelector<'a, S> {
    pub fn new(
        source: &'a S,
        include: &'a FilePattern,
        skips: &'a SkipPatternSet,
        namespaces: &'a Namespaces,
    ) -> Self {
        DatasetSelector {
            source,
            include,
            skips,
            namespaces,
        }
    }

    /// Access addresses of every selected dataset under the mission.
    ///
    /// Fails only when the mission's own catalog can't be read; a nested
    /// catalog that can't be read is logged and its branch dropped.
    pub async fn select(
        &self,
        mission: &MissionDirectory,
    ) -> Result<Vec<DatasetReference>, CrawlError> {
        let mut selected = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = VecDeque::new();

        let root = CatalogLocation::from_url(mission.catalog.clone())?;
        visited.insert(root.document().clone());
        pending.push_back(root);

        let mut is_root = true;
        while let Some(location) = pending.pop_front() {
            let catalog = match fetch_catalog(self.source, &location, self.namespaces).await {
                Ok(catalog) => catalog,
                Err(e) if is_root => return Err(e),
                Err(e) => {
                    tracing::warn!(mission = %mission.name, "Skipping sub-catalog: {}", e);
                    continue;
                }
            };
            is_root = false;

            for dataset in &catalog.datasets {
                if self.skips.skips_dataset(dataset) {
                    tracing::debug!(dataset = %dataset.name, id = ?dataset.id, "Skipping dataset");
                    continue;
                }
                if !self.include.is_match(&dataset.name) {
                    continue;
                }
                selected.extend(
                    catalog
                        .access_points(dataset)
                        .into_iter()
                        .filter(|r| r.service_kind.eq_ignore_ascii_case(ACCESS_SERVICE)),
                );
            }

            for reference in &catalog.references {
                if self.skips.skips_reference(reference) {
                    tracing::debug!(reference = %reference.title, "Skipping catalog reference");
                    continue;
                }
                match self.child_location(&catalog.url, reference) {
                    Ok(child) => {
                        if visited.insert(child.document().clone()) {
                            pending.push_back(child);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(mission = %mission.name, "Skipping catalog reference: {}", e)
                    }
                }
            }
        }

        Ok(selected)
    }

    fn child_location(
        &self,
        parent: &Url,
        reference: &CatalogRef,
    ) -> Result<CatalogLocation, CrawlError> {
        let url = parent
            .join(&reference.href)
            .map_err(|e| CrawlError::invalid_address(&reference.href, e))?;

        CatalogLocation::from_url(url)
    }
}

// -- Tests -------------------------------------------------------------------
