mod cli;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting PipeLens - Azure DevOps Pipeline Catalog");
    cli.execute().await?;

    Ok(())
}
