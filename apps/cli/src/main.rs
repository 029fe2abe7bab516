//! siteprofiler CLI: build a business profile from a website address.
//!
//! Reads a site through public relays, maps its pages and asks a language
//! model for a structured profile (name, description, audiences, colours,
//! catalog).

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
