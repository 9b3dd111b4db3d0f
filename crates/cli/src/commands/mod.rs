//! Subcommand implementations.
//!
//! Each command connects to `PostgreSQL` through [`PgStore`] and does its work
//! against the store ports, so the logic can be tested with the in-memory
//! store.

pub mod catalog;
pub mod schema;
pub mod user;

use thiserror::Error;

use stockroom_api::config::{ConfigError, database_url_from_env};
use stockroom_api::db::{PgStore, RepositoryError, create_pool};
use stockroom_api::services::auth::AuthError;
use stockroom_core::EmailError;

/// Pool size for one-shot commands.
const CLI_MAX_CONNECTIONS: u32 = 2;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No user with that email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    /// Token could not be minted.
    #[error("Token error: {0}")]
    Token(#[from] AuthError),

    /// Seed file could not be read.
    #[error("Cannot read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for a catalog.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed file parsed but its contents are unusable.
    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),

    /// A command argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Connect to the configured database.
///
/// # Errors
///
/// Returns `CommandError` if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgStore, CommandError> {
    let database_url = database_url_from_env()?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url, CLI_MAX_CONNECTIONS).await?;
    Ok(PgStore::new(pool))
}
