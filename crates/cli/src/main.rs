//! Stockroom CLI - Schema, user and catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create tables and types
//! stockroom schema apply
//!
//! # Create an admin user and mint a token for it
//! stockroom user create -e ops@example.com --admin
//! stockroom user token -e ops@example.com --ttl-minutes 120
//!
//! # Load categories and products
//! stockroom catalog seed catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `schema apply` - Apply `crates/api/schema.sql`
//! - `user create` - Create users
//! - `user token` - Mint bearer tokens for the API
//! - `user list` - List users
//! - `catalog seed` - Seed categories and products from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the database schema
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
    /// Manage users and their tokens
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Create any missing tables and types
    Apply,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Allow catalog management and viewing every order
        #[arg(long)]
        admin: bool,
    },
    /// Mint a bearer token for an existing user
    Token {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Token lifetime in minutes
        #[arg(long, default_value_t = commands::user::DEFAULT_TOKEN_TTL_MINUTES)]
        ttl_minutes: i64,
    },
    /// List all users
    List,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Create categories and products from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `user token` output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom=info,stockroom_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Schema { action } => match action {
            SchemaAction::Apply => commands::schema::apply().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create { email, admin } => {
                commands::user::create(&email, admin).await?;
            }
            UserAction::Token { email, ttl_minutes } => {
                commands::user::token(&email, ttl_minutes).await?;
            }
            UserAction::List => commands::user::list().await?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Seed { file } => {
                commands::catalog::seed(&file).await?;
            }
        },
    }
    Ok(())
}
