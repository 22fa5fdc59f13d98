use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use htmltrans::cli::{Cli, Commands};
use htmltrans::config::{self, Config};
use htmltrans::{extract, translate};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = cli.verbose || Config::load().map(|c| c.general.verbose).unwrap_or(false);
    let filter = if verbose {
        EnvFilter::new("htmltrans=debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Translate(args) => translate::run(args).await?,
        Commands::Extract(args) => extract::run(args)?,
        Commands::Cache(args) => translate::run_cache(args)?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}
