use anyhow::Context;
use campaign_opt::{logging, results::display, start_server, AppConfig, Pipeline};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Two-stage marketing campaign offer optimisation
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file (defaults to ./campaign-opt.toml when present)
    #[arg(short, long, global = true, env = "CAMPAIGN_OPT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Optimise the configured input tables once and export the results
    Run,
    /// Serve the REST API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.validate().context("invalid configuration")?;
    logging::init(&config.logging).context("initialising logging")?;

    match cli.command {
        Command::Run => {
            let outcome = tokio::task::spawn_blocking(move || Pipeline::new(&config).run_batch())
                .await
                .context("optimisation worker stopped")??;
            println!("{}", display::render(&outcome.bundle));
            if let Some(dir) = outcome.tracked_run {
                println!("Run recorded in {}", dir.display());
            }
        }
        Command::Serve => start_server(Arc::new(config)).await?,
    }

    Ok(())
}
