use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use lifecycle::Settings;
use std::path::PathBuf;

mod commands;
mod logging;

use commands::checkpoint::{CheckpointArg, CheckpointInputs};
use commands::{checkpoint, config, health, resolve};

/// NGSI asset CLI - operate the lifecycle of marketplace NGSI assets
#[derive(Parser)]
#[command(name = "ngsic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML settings file layered over the built-in defaults
    #[arg(short, long, global = true, env = "NGSI_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the identity authority and the gateway are reachable
    Health {
        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Settings inspection commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Resolve the identity application protecting an asset URL
    Resolve {
        /// Public URL of the NGSI API
        asset_url: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run one lifecycle checkpoint against JSON records
    Checkpoint {
        #[arg(value_enum)]
        checkpoint: CheckpointArg,

        /// Asset JSON file; rewritten when the checkpoint updates the asset
        #[arg(short, long)]
        asset: PathBuf,

        /// Provider submitting the specification (defaults to the asset provider)
        #[arg(long)]
        provider: Option<String>,

        /// Product JSON file (spec-attachment)
        #[arg(long)]
        product: Option<PathBuf>,

        /// Product offering JSON file (offering-validation)
        #[arg(long)]
        offering: Option<PathBuf>,

        /// Order JSON file (acquisition, suspension)
        #[arg(long)]
        order: Option<PathBuf>,

        /// Do not create a dataset for an asset that already records one
        #[arg(long)]
        skip_provisioned: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List the effective settings with secrets masked
    List {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read a single settings value
    Get {
        /// Settings path (e.g., "identity.url")
        section: String,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let _log_guard = logging::init_logging(cli.verbose)?;

    let settings = match Settings::load(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!(
                "{}",
                "Check the settings file and the BAE_ASSET_* environment variables".yellow()
            );
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Commands::Health { format } => health::execute(&settings, format).await,
        Commands::Config { action } => match action {
            ConfigAction::List { format } => config::list(&settings, format),
            ConfigAction::Get { section, format } => config::get(&settings, section, format),
        },
        Commands::Resolve { asset_url, format } => {
            resolve::execute(&settings, asset_url, format).await
        }
        Commands::Checkpoint {
            checkpoint,
            asset,
            provider,
            product,
            offering,
            order,
            skip_provisioned,
        } => {
            let inputs = CheckpointInputs {
                asset,
                provider,
                product,
                offering,
                order,
                skip_provisioned,
            };
            checkpoint::execute(settings, checkpoint, inputs).await
        }
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
