//! ProDigital CLI - operator tools for the review catalog.
//!
//! # Usage
//!
//! ```bash
//! # Show the catalog the storefront is serving
//! pdr catalog list
//! pdr catalog show p-1
//!
//! # Manage Gemini API keys
//! pdr keys list
//! pdr keys add AIza...
//! pdr keys remove 2
//!
//! # Run an admin command without the panel
//! pdr run "bump the rating of Kajabi to 5"
//! ```
//!
//! # Commands
//!
//! - `catalog` - Inspect catalog entries
//! - `site` - Inspect site configuration
//! - `keys` - Manage the credential list
//! - `run` - Send one admin command through the AI agent
//! - `scan` - Ask the agent for a one-sentence catalog analysis
//! - `reset` - Restore seed content
//!
//! Reads the same environment as the admin panel (`PDR_DATA_DIR`,
//! `GEMINI_API_KEY`, ...), so both see the same data directory.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pdr")]
#[command(author, version, about = "ProDigital Reviews operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect catalog entries
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect site configuration
    Site {
        #[command(subcommand)]
        action: SiteAction,
    },
    /// Manage Gemini API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Run one admin command through the AI agent
    Run {
        /// Natural-language instruction
        command: String,
    },
    /// Ask the agent for a one-sentence catalog analysis
    Scan,
    /// Restore the seed catalog and default site configuration
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List every entry
    List {
        /// Only entries in this category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Print one entry as JSON
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum SiteAction {
    /// Print the site configuration as JSON
    Show,
}

#[derive(Subcommand)]
enum KeysAction {
    /// List slots with masked previews
    List,
    /// Append a key
    Add {
        /// API key
        key: String,
    },
    /// Replace the key in a slot (1-based)
    Set {
        /// Slot number
        slot: usize,
        /// API key
        key: String,
    },
    /// Remove a slot (1-based)
    Remove {
        /// Slot number
        slot: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "prodigital_cli=info,prodigital_admin=warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { category } => commands::catalog::list(category.as_deref())?,
            CatalogAction::Show { id } => commands::catalog::show(&id)?,
        },
        Commands::Site { action } => match action {
            SiteAction::Show => commands::catalog::site()?,
        },
        Commands::Keys { action } => match action {
            KeysAction::List => commands::keys::list().await?,
            KeysAction::Add { key } => commands::keys::add(&key).await?,
            KeysAction::Set { slot, key } => commands::keys::set(slot, &key).await?,
            KeysAction::Remove { slot } => commands::keys::remove(slot).await?,
        },
        Commands::Run { command } => commands::agent::run(&command).await?,
        Commands::Scan => commands::agent::scan().await?,
        Commands::Reset { yes } => commands::agent::reset(yes).await?,
    }
    Ok(())
}
