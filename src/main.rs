use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rublebot::core::log::init_logging;
use tracing::level_filters::LevelFilter;

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

impl From<Commands> for rublebot::AppCommand {
    fn from(cmd: Commands) -> rublebot::AppCommand {
        match cmd {
            Commands::Serve => rublebot::AppCommand::Serve,
            Commands::Ask { text } => rublebot::AppCommand::Ask(text),
            Commands::Rates => rublebot::AppCommand::Rates,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the Telegram bot
    Serve,
    /// Answer a single message as the bot would
    Ask {
        /// Message text, e.g. "Евро [RUB/EUR]"
        text: String,
    },
    /// Display current rates for all supported currencies
    Rates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => rublebot::cli::setup::setup(),
        Some(cmd) => rublebot::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
