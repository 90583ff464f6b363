//! Peoplesync CLI - Command line interface for contact synchronization.
//!
//! This tool reconciles the local address book with a remote contact
//! directory and reports on the sync state.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use peoplesync_common::Error;
use peoplesync_contacts::{ContactStore, JsonFileStore};
use peoplesync_remote::{create_default_registry, RemoteSession, StoredCredentials, AUTHENTICATE_FIRST};
use peoplesync_sync::{LinkStore, SyncEngine, SYNCHRONISED};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "peoplesync")]
#[command(about = "Peoplesync - Two-way contact synchronization")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronise local contacts with the remote directory.
    Sync,

    /// Show local contact and link counts.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync => cmd_sync(&config).await,
        Commands::Status => cmd_status(&config).await,
    }
}

/// Run one reconciliation.
async fn cmd_sync(config: &AppConfig) -> Result<()> {
    let Some(credentials) = StoredCredentials::load(&config.credentials_file)
        .context("Failed to read credentials")?
    else {
        anyhow::bail!(AUTHENTICATE_FIRST);
    };

    let directory = create_default_registry()
        .resolve(&config.directory.provider, config.directory.config.clone())
        .with_context(|| format!("Failed to open '{}' directory", config.directory.provider))?;
    let session = RemoteSession::from_credentials(directory, credentials);

    let mut store = JsonFileStore::open(&config.contacts_file).with_context(|| {
        format!(
            "Failed to open contacts file {}",
            config.contacts_file.display()
        )
    })?;

    info!("Syncing {}", config.contacts_file.display());
    let mut engine = SyncEngine::new(LinkStore::new(&config.links_file), config.sync.clone());

    match engine.run(&mut store, &session).await {
        Ok(report) => {
            println!("{}", SYNCHRONISED);
            println!("  {}", report);
            Ok(())
        }
        Err(Error::Precondition(message)) => anyhow::bail!(message),
        Err(e) => Err(e).context("Sync failed"),
    }
}

/// Show local sync state without contacting the directory.
async fn cmd_status(config: &AppConfig) -> Result<()> {
    let store = JsonFileStore::open(&config.contacts_file).with_context(|| {
        format!(
            "Failed to open contacts file {}",
            config.contacts_file.display()
        )
    })?;
    let contacts = store.list_contacts()?;
    let linked = contacts.iter().filter(|c| c.is_linked()).count();
    let links = LinkStore::new(&config.links_file)
        .load()
        .await
        .context("Failed to read link set")?;
    let authenticated = StoredCredentials::load(&config.credentials_file)
        .context("Failed to read credentials")?
        .is_some();

    println!("Contacts file: {}", config.contacts_file.display());
    println!("  Contacts: {}", contacts.len());
    println!("  Linked: {}", linked);
    println!("Link set: {}", config.links_file.display());
    println!("  Entries: {}", links.len());
    println!("Directory: {}", config.directory.provider);
    println!("  Credentials: {}", if authenticated { "present" } else { "missing" });

    Ok(())
}
