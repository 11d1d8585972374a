//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::campaign::Campaign;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover platform files and write the campaign load plan
    Load {
        /// Sample every source with the campaign's test stride
        #[arg(long)]
        test: bool,
        #[command(flatten)]
        campaign: CampaignArgs,
        /// Where to write the load plan (default: home directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the files discovered for one platform
    Crawl {
        /// Platform name, e.g. tethys
        platform: String,
        #[command(flatten)]
        campaign: CampaignArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CampaignArgs {
    /// Campaign YAML file (default: built-in CANON off season 2017)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the campaign start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Override the campaign end date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl CampaignArgs {
    pub fn resolve(&self) -> Result<Campaign> {
        let campaign = match &self.config {
            Some(path) => Campaign::load(path)?,
            None => Campaign::os2017(),
        };

        campaign.with_window(self.start, self.end)
    }
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------
