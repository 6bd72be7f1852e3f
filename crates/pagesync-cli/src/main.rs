//! pagesync CLI
//!
//! Command-line interface for the pagesync content synchronization engine.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagesync_core::{
    backend_from_config, Broadcaster, Config, ContentStore, LocalStore, Reconciler, RemoteStore,
};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "pagesync")]
#[command(about = "Sync site content between local storage and a remote backend")]
#[command(version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and sync status
    Status,
    /// Run a full check-then-sync cycle once
    Check,
    /// Download and apply remote content unconditionally of the timer
    Sync,
    /// Upload local content to the remote backend
    Publish,
    /// Run the auto-sync timer in the foreground, streaming events
    Watch,
    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },
}

/// Shared handles the command handlers work against
pub struct App {
    pub config: Config,
    pub local: LocalStore,
    pub content: Arc<ContentStore>,
    pub broadcaster: Arc<Broadcaster>,
}

impl App {
    /// Load configuration and open local storage
    fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let local =
            LocalStore::open(config.data_dir.clone()).context("Failed to open local storage")?;
        let content = Arc::new(
            ContentStore::with_local(local.clone()).context("Failed to load local content")?,
        );
        let broadcaster = Arc::new(Broadcaster::new(local.clone()));

        Ok(Self {
            config,
            local,
            content,
            broadcaster,
        })
    }

    /// Build the remote backend adapter from configuration
    pub fn remote(&self) -> Result<Arc<dyn RemoteStore>> {
        backend_from_config(&self.config).context("Failed to initialize remote backend")
    }

    /// Build a reconciler over this app's stores
    pub fn reconciler(&self) -> Result<Reconciler> {
        let remote = self.remote()?;
        Reconciler::new(
            remote,
            self.content.clone(),
            self.local.clone(),
            self.broadcaster.clone(),
            &self.config,
        )
        .context("Failed to initialize reconciler")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match cli.command {
        Commands::Status => {
            let app = App::open()?;
            commands::status::show(&app, &output)?;
        }
        Commands::Check => {
            let app = App::open()?;
            commands::sync::check(&app, &output).await?;
        }
        Commands::Sync => {
            let app = App::open()?;
            commands::sync::sync(&app, &output).await?;
        }
        Commands::Publish => {
            let app = App::open()?;
            commands::publish::publish(&app, &output).await?;
        }
        Commands::Watch => {
            let app = App::open()?;
            commands::watch::watch(&app, &output).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let app = App::open()?;
                commands::config::show(&app.config, &output)?;
            }
            ConfigCommands::Set { key, value } => {
                commands::config::set(key, value, &output)?;
            }
        },
    }

    Ok(())
}
