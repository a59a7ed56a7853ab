// src/main.rs — tsengine entry point

use clap::Parser;

use tsengine::cli::{Cli, Commands};
use tsengine::infra::config::Config;
use tsengine::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Respects RUST_LOG; --log-level is the fallback
    logger::init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Fetch { id, style } => tsengine::cli::fetch::run_fetch(&config, &id, style).await,
        Commands::Definition { action } => {
            tsengine::cli::definition::run_definition(&config, action).await
        }
        Commands::Status => tsengine::cli::status::show_status(&config, cli.config.as_deref()).await,
    }
}
