use std::path::PathBuf;

use anyhow::Result;

use crate::{
    campaign::Campaign,
    catalog::{CatalogSource, HttpCatalogSource, Namespaces},
    cli::{create_progress_bar, CampaignArgs},
    manifest::LoadManifest,
    orchestrator::{Orchestrator, RunMode, RunSummary, SourceRegistry},
};

use super::make_manifest_file_name;

pub async fn load(test: bool, args: &CampaignArgs, output: Option<PathBuf>) -> Result<String> {
    let campaign = args.resolve()?;
    let catalogs = HttpCatalogSource::new(campaign.request_timeout())?;
    let mode = if test { RunMode::Test } else { RunMode::Production };

    let (manifest, summary) = plan(&catalogs, &campaign, mode).await?;

    for name in &summary.skipped {
        println!("Skipped `{}`: no files found", name);
    }
    for (name, reason) in &summary.failed {
        println!("Failed to load `{}`: {}", name, reason);
    }
    println!("Planned {} sources", summary.loaded.len());

    let path = match output {
        Some(path) => path,
        None => make_manifest_file_name(&campaign.name)?,
    };
    manifest.save(&path)?;

    Ok(path.to_string_lossy().to_string())
}

/// Discovers every crawled platform, then runs the orchestrator into a load
/// manifest.
async fn plan<S: CatalogSource>(
    catalogs: &S,
    campaign: &Campaign,
    mode: RunMode,
) -> Result<(LoadManifest, RunSummary)> {
    let window = campaign.window()?;
    let skips = campaign.skip_set()?;
    let namespaces = Namespaces::default();
    let mut registry = SourceRegistry::from_campaign(campaign, &window);

    tracing::info!(
        campaign = %campaign.name,
        start = %window.start(),
        end = %window.end(),
        "Campaign window"
    );

    let pb = create_progress_bar(
        campaign.platforms.len() as u64,
        "Crawling platforms...".to_string(),
    );
    for platform in &campaign.platforms {
        pb.set_message(format!("Crawling {}...", platform.name));
        registry
            .discover(catalogs, platform, &window, &skips, &namespaces)
            .await;
        pb.inc(1);
    }
    pb.finish_with_message("Platforms crawled");

    let mut manifest = LoadManifest::new(&campaign.name, &campaign.description);
    let summary = Orchestrator::new(mode, campaign.test_stride).run(&mut registry, &mut manifest);

    Ok((manifest, summary))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::testing::{catalog_ref, catalog_xml, leaf, StaticCatalogSource};

    const TETHYS: &str = "http://dodstemp.shore.mbari.org:8080/thredds/catalog/LRAUV/tethys/missionlogs/2016/";

    fn tethys_catalogs() -> StaticCatalogSource {
        StaticCatalogSource::default()
            .with(
                &format!("{}catalog.xml", TETHYS),
                &catalog_xml(&catalog_ref("20170301_20170310")),
            )
            .with(
                &format!("{}20170301_20170310/catalog.xml", TETHYS),
                &catalog_xml(&catalog_ref("20170301T000000")),
            )
            .with(
                &format!("{}20170301_20170310/20170301T000000/catalog.xml", TETHYS),
                &catalog_xml(&leaf(
                    "201703010000_10S_sci.nc",
                    "LRAUV/tethys/missionlogs/2016/20170301_20170310/20170301T000000/201703010000_10S_sci.nc",
                )),
            )
    }

    #[tokio::test]
    async fn should_plan_all_sources_in_test_mode() {
        let (manifest, summary) = plan(&tethys_catalogs(), &Campaign::os2017(), RunMode::Test)
            .await
            .unwrap();

        assert_eq!(summary.loaded, vec!["m1", "tethys"]);
        assert_eq!(manifest.sources[1].stride, Some(100));
        assert_eq!(
            manifest.sources[1].urls,
            vec!["http://dods.mbari.org/opendap/data/lrauv/tethys/missionlogs/2016/20170301_20170310/20170301T000000/201703010000_10S_sci.nc"]
        );
    }

    #[tokio::test]
    async fn should_plan_fixed_sources_when_catalogs_are_offline() {
        let (manifest, summary) = plan(
            &StaticCatalogSource::default(),
            &Campaign::os2017(),
            RunMode::Production,
        )
        .await
        .unwrap();

        assert_eq!(summary.loaded, vec!["m1"]);
        assert_eq!(summary.skipped, vec!["tethys"]);
        assert_eq!(manifest.sources.len(), 1);
        assert_eq!(manifest.sources[0].stride, None);
    }
}
