//! Odin deployer
//!
//! Commands:
//! - publish: write a release and its payload to the object store (client hop)
//! - validate: re-validate a received release against the object store (deployer hop)
//! - paths: print the object-store keys derived for a release

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use odin_release::{publish, Release, ReleaseDocument};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "odin-deployer")]
#[command(about = "Publish and validate Odin releases")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a release definition and its payload
    Publish {
        /// Release document (JSON)
        #[arg(short, long)]
        release: PathBuf,

        /// Bootstrap payload (user data)
        #[arg(short, long)]
        payload: PathBuf,
    },

    /// Validate a release document against the stored copy
    Validate {
        /// Release document (JSON) as handed to the deployer
        #[arg(short, long)]
        release: PathBuf,
    },

    /// Print the object-store keys for a release
    Paths {
        /// Release document (JSON)
        #[arg(short, long)]
        release: PathBuf,
    },
}

fn read_release(path: &Path) -> Result<Release> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read release file: {}", path.display()))?;
    let document = ReleaseDocument::from_json(&bytes)
        .with_context(|| format!("Invalid release document: {}", path.display()))?;
    Ok(Release::from(document))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,odin_release=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!("Object store: {}", config.store_url);

    let region = config.aws_region.as_deref();
    let account = config.aws_account_id.as_deref();

    match cli.command {
        Commands::Publish { release, payload } => {
            let store = config.open_store()?;
            let draft = read_release(&release)?.with_region_account(region, account);
            let payload = std::fs::read(&payload)
                .with_context(|| format!("Failed to read payload: {}", payload.display()))?;

            let published = publish(draft, &payload, store.as_ref(), chrono::Utc::now())?;

            let json = serde_json::to_string_pretty(&published.to_document())
                .context("Failed to serialize release")?;
            println!("{}", json);
        }

        Commands::Validate { release } => {
            let store = config.open_store()?;
            let mut received = read_release(&release)?;
            received.seal()?;

            let mut received = received.with_region_account(region, account).with_defaults();
            received.validate(store.as_ref())?;

            println!(
                "Release {} is valid",
                received.release_id.as_deref().unwrap_or_default()
            );
        }

        Commands::Paths { release } => {
            let release = read_release(&release)?
                .with_region_account(region, account)
                .with_defaults();

            println!("bucket:   {}", release.bucket.as_deref().unwrap_or_default());
            println!("lock:     {}", release.lock_path()?);
            println!("halt:     {}", release.halt_path()?);
            println!("release:  {}", release.release_path()?);
            println!("userdata: {}", release.user_data_path()?);
        }
    }

    Ok(())
}
