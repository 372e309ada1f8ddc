use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use kurs::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for kurs::AppCommand {
    fn from(cmd: Commands) -> kurs::AppCommand {
        match cmd {
            Commands::Serve { listen } => kurs::AppCommand::Serve { listen },
            Commands::Watch => kurs::AppCommand::Watch,
            Commands::Convert { amount, from, to } => {
                kurs::AppCommand::Convert { from, to, amount }
            }
            Commands::Currencies => kurs::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the rate proxy server
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:5000
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Convert interactively as you type
    Watch,
    /// Convert an amount once
    Convert {
        /// Amount to convert
        amount: f64,
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
    },
    /// List the currencies the proxy offers
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => kurs::cli::setup::setup(),
        Some(cmd) => kurs::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
