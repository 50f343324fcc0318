mod favorites;
mod search;
mod stock;

use serde_json::Value;
use tickwatch_core::{ClientConfig, TickwatchClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let config = build_config(cli, ClientConfig::from_env()?);
    let client = TickwatchClient::from_config(&config);

    match &cli.command {
        Command::Favorites(args) => favorites::run(&args.command, client.favorites()).await,
        Command::Stock(args) => stock::run(args, client.stocks()).await,
        Command::Search(args) => search::run(args, client.search()).await,
    }
}

/// Command-line flags take precedence over the environment.
fn build_config(cli: &Cli, mut config: ClientConfig) -> ClientConfig {
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url.trim_end_matches('/'));
    }
    if let Some(cache_dir) = &cli.cache_dir {
        config = config.with_cache_dir(cache_dir.clone());
    }
    config
}
