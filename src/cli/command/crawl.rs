use anyhow::{anyhow, Result};

use crate::{
    campaign::Campaign,
    catalog::{CatalogSource, HttpCatalogSource, Namespaces},
    cli::{create_spinner, CampaignArgs},
    platform::register_platform,
};

/// Crawls one platform and returns the access address of every file found.
pub async fn crawl(platform: &str, args: &CampaignArgs) -> Result<Vec<String>> {
    let campaign = args.resolve()?;
    let catalogs = HttpCatalogSource::new(campaign.request_timeout())?;

    let bar = create_spinner(format!("Crawling {}...", platform));
    let urls = crawl_platform(&catalogs, &campaign, platform).await;
    bar.finish_and_clear();

    urls
}

async fn crawl_platform<S: CatalogSource>(
    catalogs: &S,
    campaign: &Campaign,
    name: &str,
) -> Result<Vec<String>> {
    let platform = campaign
        .platform(name)
        .ok_or_else(|| anyhow!("Platform `{}` is not part of campaign {}", name, campaign.name))?;
    let window = campaign.window()?;
    let skips = campaign.skip_set()?;

    let source =
        register_platform(catalogs, platform, &window, &skips, &Namespaces::default()).await?;

    Ok(source.file_urls())
}

// -- Tests -------------------------------------------------------------------
