mod campaign;
mod catalog;
mod cli;
mod error;
mod manifest;
mod mission;
mod orchestrator;
mod platform;
mod select;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Load {
            test,
            campaign,
            output,
        } => match command::load(*test, campaign, output.clone()).await {
            Ok(filename) => println!("Load plan saved to `{}`", filename),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
        Commands::Crawl { platform, campaign } => match command::crawl(platform, campaign).await {
            Ok(urls) => urls.iter().for_each(|url| println!("{}", url)),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
