pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::form::ConversionForm;
use crate::providers::{FrankfurterProvider, ProxyClient};

/// Commands the application can execute, decoupled from the CLI parser.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Serve { listen: Option<String> },
    Watch,
    Convert { from: String, to: String, amount: f64 },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("kurs starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve { listen } => {
            let provider = Arc::new(FrankfurterProvider::new(&config.upstream.base_url));
            let listen = listen.unwrap_or(config.server.listen);
            server::serve(&listen, provider).await
        }
        AppCommand::Watch => {
            let client = ProxyClient::new(&config.client.api_url);
            let form = ConversionForm::new(
                &config.client.from,
                &config.client.to,
                Duration::from_millis(config.client.debounce_ms),
            );
            cli::watch::run(&client, form).await
        }
        AppCommand::Convert { from, to, amount } => {
            let client = ProxyClient::new(&config.client.api_url);
            cli::convert::run(&client, &from, &to, amount).await
        }
        AppCommand::Currencies => {
            let client = ProxyClient::new(&config.client.api_url);
            cli::currencies::run(&client).await
        }
    }
}
