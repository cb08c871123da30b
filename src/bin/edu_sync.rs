//! Maintenance entrypoint running the bulk naming pass outside the HTTP server.
//!
//! Uses the same configuration as the server binary and prints the resulting report as JSON.
use anyhow::{Context, Result};
use clap::Parser;
use edu_api::{bootstrap, config, logging};

#[derive(Parser)]
#[command(
    name = "edu-sync",
    about = "Name unnamed materials and delete materials with junk content"
)]
struct Cli {
    /// Regenerate titles for materials that already have one.
    #[arg(long)]
    force_rename: bool,
    /// Print the report on a single line.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing("edu-sync");
    let config = config::init_config().context("failed to load configuration")?;

    let service = bootstrap::build_service(config).await?;
    let report = service
        .sync_all(cli.force_rename)
        .await
        .context("bulk naming pass failed")?;

    let rendered = if cli.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to render report")?;
    println!("{rendered}");
    Ok(())
}
