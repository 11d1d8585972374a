pub mod crawl;
pub mod load;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local};
pub use crawl::crawl;
pub use load::load;

pub fn make_manifest_file_name(campaign: &str) -> Result<PathBuf> {
    let today = Local::now();
    let file_name = format!(
        "{}-load-plan-{}-{:02}-{:02}.json",
        campaign,
        today.year(),
        today.month(),
        today.day()
    );

    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find a home directory"))?;
    Ok(home.join(file_name))
}
