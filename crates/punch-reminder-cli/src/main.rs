use std::path::PathBuf;

use clap::{Parser, Subcommand};
use punch_reminder_core::FileConfigSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod commands;

#[derive(Parser)]
#[command(name = "punch-reminder", version, about = "Punch Reminder CLI")]
struct Cli {
    /// Config file (default: ~/.config/punch-reminder/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Evaluate one position against the configured geofence
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Run the monitor in the foreground
    Run(commands::run::RunArgs),
    /// Report whether the check-in app was used today
    CheckedIn(commands::checked_in::CheckedInArgs),
}

fn config_source(path: Option<PathBuf>) -> Result<FileConfigSource, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(FileConfigSource::new(path)),
        None => Ok(FileConfigSource::default_location()?),
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = config_source(cli.config).and_then(|source| match cli.command {
        Commands::Config { action } => commands::config::run(&source, action),
        Commands::Evaluate(args) => commands::evaluate::run(&source, args),
        Commands::Run(args) => commands::run::run(source, args),
        Commands::CheckedIn(args) => commands::checked_in::run(source, args),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
