mod cli;
mod commands;
mod config;
mod output;
mod store;

use anyhow::Result;
use clap::Parser;
use contabilidad::dates;
use contabilidad::dev_backend::DevBackend;
use contabilidad::{MovementsApi, MovementsClient};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::Context;
use config::AppConfig;
use store::LocalStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("contabilidad=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Commands::ConfigPath = cli.command {
        return commands::config_path();
    }

    let config = AppConfig::load()?;
    let today = dates::today();

    let api: Box<dyn MovementsApi> = if cli.dev {
        tracing::info!("using in-memory dev backend");
        Box::new(DevBackend::seeded(today))
    } else {
        Box::new(MovementsClient::new(
            &config.api_url,
            config.api_token.clone(),
        )?)
    };
    let data_dir = if cli.dev {
        config.data_dir()?.join("dev")
    } else {
        config.data_dir()?
    };

    let ctx = Context {
        api,
        store: LocalStore::new(data_dir),
        config,
        today,
    };
    commands::run(cli.command, &ctx).await
}
