use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gallery_core::Config;
use gallery_db::Gallery;
use tracing::{error, info};

mod admin;

#[derive(Parser)]
#[command(name = "gallery-cli")]
#[command(about = "Character gallery database administration")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database if needed and apply pending migrations
    Migrate,
    /// Upsert the item catalog from a JSON pool file
    Seed {
        /// Pool file (defaults to ITEM_POOL_PATH)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Generate a new API key and print it once
    ApiKey {
        /// Label for the key owner
        #[arg(short, long)]
        name: String,
    },
    /// List API keys without their secrets
    ApiKeys,
    /// List the item catalog
    Items,
    /// List characters one page at a time
    Characters {
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        /// Page size, 0 for the default
        #[arg(short, long, default_value_t = 0)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    info!("Using database at {}", config.database_path().display());

    // Connecting applies migrations
    let gallery = Gallery::connect(&config).await?;

    let result = match command {
        Command::Migrate => {
            println!("Database is up to date.");
            Ok(())
        }
        Command::Seed { file } => {
            let path = file.unwrap_or_else(|| config.item_pool_path.clone());
            admin::seed(&gallery, &path).await
        }
        Command::ApiKey { name } => admin::create_api_key(&gallery, &name).await,
        Command::ApiKeys => admin::list_api_keys(&gallery).await,
        Command::Items => admin::list_items(&gallery).await,
        Command::Characters { page, limit } => {
            admin::list_characters(&gallery, page, limit).await
        }
    };

    gallery.close().await;
    result
}
