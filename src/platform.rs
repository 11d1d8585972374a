//! Per-platform file discovery.

use std::collections::HashSet;

use chrono::{NaiveDateTime, NaiveTime};
use futures::future::join_all;
use url::Url;

use crate::{
    campaign::{CrawledPlatform, FixedSource},
    catalog::{fetch_catalog, CatalogLocation, CatalogSource, Namespaces},
    error::NoDatasetsFound,
    mission::{missions_in_window, CampaignWindow},
    select::{DatasetSelector, FilePattern, SkipPatternSet},
};

/// Everything the loader needs to know about one source.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSource {
    pub name: String,
    pub browse_base: Option<String>,
    pub access_base: String,
    pub parameters: Vec<String>,
    /// Paths relative to `access_base`.
    pub files: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PlatformSource {
    pub fn fixed(source: &FixedSource, window: &CampaignWindow) -> Self {
        PlatformSource {
            name: source.name.clone(),
            browse_base: None,
            access_base: source.access_base.clone(),
            parameters: source.parameters.clone(),
            files: source.files.clone(),
            start: source
                .start
                .map_or(window.start_datetime(), |d| d.and_time(NaiveTime::MIN)),
            end: source
                .end
                .map_or(window.end_datetime(), |d| d.and_time(NaiveTime::MIN)),
        }
    }

    /// A crawled platform before discovery has run.
    pub fn crawled(platform: &CrawledPlatform, window: &CampaignWindow) -> Self {
        PlatformSource {
            name: platform.name.clone(),
            browse_base: Some(platform.browse_url()),
            access_base: platform.access_url(),
            parameters: platform.parameters.clone(),
            files: Vec::new(),
            start: platform
                .start
                .map_or(window.start_datetime(), |d| d.and_time(NaiveTime::MIN)),
            end: platform
                .end
                .map_or(window.end_datetime(), |d| d.and_time(NaiveTime::MIN)),
        }
    }

    /// Full access addresses of the files.
    pub fn file_urls(&self) -> Vec<String> {
        let base = self.access_base.trim_end_matches('/');
        self.files.iter().map(|f| format!("{}/{}", base, f)).collect()
    }
}

/// Crawls `platform`'s catalog and returns its source with the file list
/// filled in.
pub async fn register_platform<S: CatalogSource>(
    source: &S,
    platform: &CrawledPlatform,
    window: &CampaignWindow,
    skips: &SkipPatternSet,
    namespaces: &Namespaces,
) -> Result<PlatformSource, NoDatasetsFound> {
    let root = platform.browse_url();
    let no_datasets = || NoDatasetsFound {
        pattern: platform.select.clone(),
        root: root.clone(),
    };

    let include: FilePattern = match platform.select.parse() {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::warn!(platform = %platform.name, "{:#}", e);
            return Err(no_datasets());
        }
    };

    let urls = match discover_urls(source, &root, window, &include, skips, namespaces).await {
        Some(urls) => urls,
        None => return Err(no_datasets()),
    };

    let files = relative_files(urls);
    if files.is_empty() {
        return Err(no_datasets());
    }

    tracing::info!(platform = %platform.name, files = files.len(), "Registered platform");

    let mut registered = PlatformSource::crawled(platform, window);
    registered.files = files;
    Ok(registered)
}

// None when the platform catalog itself can't be read.
async fn discover_urls<S: CatalogSource>(
    source: &S,
    root: &str,
    window: &CampaignWindow,
    include: &FilePattern,
    skips: &SkipPatternSet,
    namespaces: &Namespaces,
) -> Option<Vec<Url>> {
    let location = match CatalogLocation::new(root) {
        Ok(location) => location,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", root, e);
            return None;
        }
    };

    tracing::info!(url = %location, "Crawling");
    let catalog = match fetch_catalog(source, &location, namespaces).await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!("Skipping {} (error parsing the XML): {}", location, e);
            return None;
        }
    };

    let selector = DatasetSelector::new(source, include, skips, namespaces);
    let missions: Vec<_> = missions_in_window(&catalog, window).collect();
    let results = join_all(missions.iter().map(|m| selector.select(m))).await;

    let mut urls = Vec::new();
    for (mission, result) in missions.iter().zip(results) {
        match result {
            Ok(refs) => urls.extend(refs.into_iter().map(|r| r.url)),
            Err(e) => tracing::warn!(mission = %mission.name, "Skipping mission: {}", e),
        }
    }

    Some(urls)
}

/// Sorts addresses lexically, drops duplicates and keeps the last three path
/// segments (deployment/subdir/filename) of each.
pub fn relative_files(mut urls: Vec<Url>) -> Vec<String> {
    urls.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    urls.dedup();

    let mut seen = HashSet::new();
    urls.iter()
        .map(relative_path)
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

fn relative_path(url: &Url) -> String {
    let segments: Vec<&str> = url.path().split('/').collect();
    let keep = segments.len().saturating_sub(3);

    segments[keep..].join("/")
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::testing::{catalog_ref, catalog_xml, leaf, StaticCatalogSource};

    const ROOT: &str = "http://example.org/thredds/catalog/LRAUV/tethys/missionlogs/2016/";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> CampaignWindow {
        CampaignWindow::new(date(2017, 1, 1), date(2017, 12, 31)).unwrap()
    }

    fn platform() -> CrawledPlatform {
        CrawledPlatform {
            name: "tethys".to_string(),
            browse_root: "http://example.org/thredds/catalog/LRAUV/{platform}/missionlogs/{year}/"
                .to_string(),
            access_root: "http://example.org/opendap/data/lrauv/{platform}/missionlogs/{year}/"
                .to_string(),
            year: "2016".to_string(),
            select: ".*10S_sci.nc$".to_string(),
            parameters: vec!["temperature".to_string()],
            start: None,
            end: None,
        }
    }

    fn deployment(mission: &str, deployment: &str, files: &[&str]) -> String {
        let body: String = files
            .iter()
            .map(|f| {
                leaf(
                    f,
                    &format!("LRAUV/tethys/missionlogs/2016/{}/{}/{}", mission, deployment, f),
                )
            })
            .collect();
        catalog_xml(&body)
    }

    // Missions listed newest first to check the final ordering.
    fn source() -> StaticCatalogSource {
        let root = catalog_xml(&format!(
            "{}{}{}{}",
            catalog_ref("20170601_20170605"),
            catalog_ref("20160615_20160620"),
            catalog_ref("badname"),
            catalog_ref("20170301_20170310"),
        ));
        StaticCatalogSource::default()
            .with(&format!("{}catalog.xml", ROOT), &root)
            .with(
                &format!("{}20170601_20170605/catalog.xml", ROOT),
                &catalog_xml(&catalog_ref("20170601T000000")),
            )
            .with(
                &format!("{}20170601_20170605/20170601T000000/catalog.xml", ROOT),
                &deployment(
                    "20170601_20170605",
                    "20170601T000000",
                    &["b_10S_sci.nc", "b_2S_eng.nc"],
                ),
            )
            .with(
                &format!("{}20170301_20170310/catalog.xml", ROOT),
                &catalog_xml(&format!(
                    "{}{}",
                    catalog_ref("20170302T000000"),
                    catalog_ref("20170301T000000")
                )),
            )
            .with(
                &format!("{}20170301_20170310/20170301T000000/catalog.xml", ROOT),
                &deployment("20170301_20170310", "20170301T000000", &["a_10S_sci.nc"]),
            )
            .with(
                &format!("{}20170301_20170310/20170302T000000/catalog.xml", ROOT),
                &deployment("20170301_20170310", "20170302T000000", &["c_10S_sci.nc", "c.cfg"]),
            )
    }

    #[tokio::test]
    async fn should_register_sorted_relative_files() {
        let source = source();
        let skips = SkipPatternSet::with_defaults(&[".*.cfg$"]).unwrap();

        let registered =
            register_platform(&source, &platform(), &window(), &skips, &Namespaces::default())
                .await
                .unwrap();

        assert_eq!(
            registered.files,
            vec![
                "20170301_20170310/20170301T000000/a_10S_sci.nc",
                "20170301_20170310/20170302T000000/c_10S_sci.nc",
                "20170601_20170605/20170601T000000/b_10S_sci.nc",
            ]
        );
        assert_eq!(
            registered.access_base,
            "http://example.org/opendap/data/lrauv/tethys/missionlogs/2016/"
        );
        assert_eq!(registered.start, window().start_datetime());
        assert_eq!(registered.end, window().end_datetime());
    }

    #[tokio::test]
    async fn should_register_identically_twice() {
        let source = source();
        let skips = SkipPatternSet::with_defaults(&[".*.cfg$"]).unwrap();
        let ns = Namespaces::default();

        let first = register_platform(&source, &platform(), &window(), &skips, &ns).await.unwrap();
        let second = register_platform(&source, &platform(), &window(), &skips, &ns).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn should_fail_without_matching_datasets() {
        let source = source();
        let skips = SkipPatternSet::empty();
        let mut platform = platform();
        platform.select = ".*_1S_sci.nc$".to_string();

        let e = register_platform(&source, &platform, &window(), &skips, &Namespaces::default())
            .await
            .unwrap_err();

        assert_eq!(e.pattern, ".*_1S_sci.nc$");
        assert_eq!(e.root, ROOT);
    }

    #[tokio::test]
    async fn should_fail_when_platform_catalog_is_unreachable() {
        let source = StaticCatalogSource::default();
        let skips = SkipPatternSet::empty();

        let e = register_platform(&source, &platform(), &window(), &skips, &Namespaces::default())
            .await
            .unwrap_err();

        assert_eq!(e.root, ROOT);
    }

    #[tokio::test]
    async fn should_register_with_bare_glob_select() {
        let source = source();
        let skips = SkipPatternSet::with_defaults(&[".*.cfg$"]).unwrap();
        let mut platform = platform();
        platform.select = "*10S_sci.nc".to_string();

        let registered =
            register_platform(&source, &platform, &window(), &skips, &Namespaces::default())
                .await
                .unwrap();

        assert_eq!(registered.files.len(), 3);
        assert!(registered.files.iter().all(|f| f.ends_with("10S_sci.nc")));
    }

    #[tokio::test]
    async fn should_fail_on_invalid_select_pattern() {
        let source = source();
        let skips = SkipPatternSet::empty();
        let mut platform = platform();
        platform.select = "[10S".to_string();

        assert!(register_platform(&source, &platform, &window(), &skips, &Namespaces::default())
            .await
            .is_err());
    }

    #[test]
    fn should_keep_last_three_segments_and_dedup() {
        let urls = vec![
            Url::parse("http://b.org/dodsC/x/2017_b/d1/f.nc").unwrap(),
            Url::parse("http://a.org/dodsC/x/2017_a/d1/f.nc").unwrap(),
            Url::parse("http://a.org/dodsC/x/2017_a/d1/f.nc").unwrap(),
            Url::parse("http://a.org/dodsC/y/2017_b/d1/f.nc").unwrap(),
        ];

        assert_eq!(relative_files(urls), vec!["2017_a/d1/f.nc", "2017_b/d1/f.nc"]);
    }

    #[test]
    fn should_narrow_fixed_source_window() {
        let fixed = FixedSource {
            name: "m1".to_string(),
            access_base: "http://example.org/opendap/m1/".to_string(),
            files: vec!["OS_M1.nc".to_string()],
            parameters: Vec::new(),
            start: Some(date(2017, 2, 1)),
            end: None,
        };

        let source = PlatformSource::fixed(&fixed, &window());

        assert_eq!(source.start.date(), date(2017, 2, 1));
        assert_eq!(source.end, window().end_datetime());
        assert_eq!(source.file_urls(), vec!["http://example.org/opendap/m1/OS_M1.nc"]);
    }
}
