use anyhow::Context;
use clap::Parser;
use tracing::debug;

use coinbridge::cli::{commands, Cli, Commands};
use coinbridge::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    config.init_logging();
    debug!(command = ?cli.command, "coinbridge starting");

    match &cli.command {
        Commands::Check => commands::check(&config)?,
        Commands::Coins(args) => commands::coins(&config, args.exchange).await?,
        Commands::Pairs(args) => commands::pairs(&config, args.exchange).await?,
        Commands::Book(args) => commands::book(&config, args).await?,
        Commands::Balances(args) => commands::balances(&config, args.exchange).await?,
        Commands::Status(args) => commands::status(&config, args).await?,
        Commands::Cancel(args) => commands::cancel(&config, args).await?,
    }
    Ok(())
}
