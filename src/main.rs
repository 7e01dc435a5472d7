//! Main entry point for the omset translation router CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omset::cli::commands::{self, Commands};
use omset::RouterConfig;

/// omset - route translations between Norwegian and the world
#[derive(Parser, Debug)]
#[command(name = "omset", version, about, long_about = None)]
struct Args {
    /// API key for DeepL (optional, defaults to DEEPL_APIKEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (JSON or YAML), replaces environment settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .ok()
                .filter(|_| !args.verbose)
                .unwrap_or_else(|| format!("{}={}", env!("CARGO_PKG_NAME"), log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    // CLI args take precedence over the environment and the config file
    let config = RouterConfig::load(args.config.as_deref(), args.api_key.as_deref())?;

    // Execute command
    match command {
        Commands::Translate {
            text,
            from,
            to,
            user,
            public,
            display,
        } => {
            commands::handle_translate(config, text, from, to, user, public, display).await?;
        }
        Commands::Batch {
            file,
            output,
            from,
            to,
            privileged,
        } => {
            commands::handle_batch(config, file, output, from, to, privileged).await?;
        }
        Commands::Detect { text } => {
            commands::handle_detect(config, text).await?;
        }
        Commands::Route { from, to } => {
            commands::handle_route(config, from, to).await?;
        }
        Commands::Languages => {
            commands::handle_languages(config).await?;
        }
        Commands::Server { host, port, debug } => {
            commands::handle_server(config, host, port, debug).await?;
        }
    }

    Ok(())
}
