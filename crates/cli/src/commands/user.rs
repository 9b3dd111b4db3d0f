//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a shopper, or an admin
//! stockroom user create -e buyer@example.com
//! stockroom user create -e ops@example.com --admin
//!
//! # Mint a bearer token for an existing user
//! stockroom user token -e buyer@example.com --ttl-minutes 120
//!
//! # List users
//! stockroom user list
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKROOM_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOCKROOM_JWT_SECRET` - Token signing secret (for `token`)

use chrono::Duration;

use stockroom_api::config::jwt_secret_from_env;
use stockroom_api::db::UserStore;
use stockroom_api::models::User;
use stockroom_api::services::auth::{AuthError, TokenKeys};
use stockroom_core::Email;

use super::{CommandError, connect};

/// Token lifetime when none is given.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Create a user in `store`.
///
/// # Errors
///
/// Returns `CommandError::UserExists` if the email is taken.
pub async fn create_in<S>(store: &S, email: &str, is_admin: bool) -> Result<User, CommandError>
where
    S: UserStore + ?Sized,
{
    let email = Email::parse(email)?;

    if store.user_by_email(&email).await?.is_some() {
        return Err(CommandError::UserExists(email.to_string()));
    }

    let user = store.create_user(&email, is_admin).await?;
    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        is_admin = user.is_admin,
        "User created"
    );
    Ok(user)
}

/// Mint a token for an existing user in `store`.
///
/// # Errors
///
/// Returns `CommandError::UserNotFound` for an unknown email, or
/// `CommandError::InvalidArgument` for a non-positive or out-of-range lifetime.
pub async fn token_in<S>(
    store: &S,
    keys: &TokenKeys,
    email: &str,
    ttl_minutes: i64,
) -> Result<String, CommandError>
where
    S: UserStore + ?Sized,
{
    if ttl_minutes <= 0 {
        return Err(CommandError::InvalidArgument(format!(
            "token lifetime must be positive (got {ttl_minutes} minutes)"
        )));
    }

    let email = Email::parse(email)?;
    let user = store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))?;

    let out_of_range = || {
        CommandError::InvalidArgument(format!(
            "token lifetime of {ttl_minutes} minutes is out of range"
        ))
    };
    let ttl = Duration::try_minutes(ttl_minutes).ok_or_else(out_of_range)?;
    let token = keys
        .issue(&user.email, ttl)
        .map_err(|err| match err {
            AuthError::ExpiryOutOfRange => out_of_range(),
            err => err.into(),
        })?;
    tracing::info!(user_id = %user.id, ttl_minutes, "Token minted");
    Ok(token)
}

/// Create a user.
///
/// # Errors
///
/// Returns `CommandError` on an invalid or duplicate email, or a database failure.
pub async fn create(email: &str, is_admin: bool) -> Result<User, CommandError> {
    let store = connect().await?;
    create_in(&store, email, is_admin).await
}

/// Mint a bearer token and print it to stdout.
///
/// # Errors
///
/// Returns `CommandError` if the secret is invalid, the user is unknown, or
/// the database fails.
pub async fn token(email: &str, ttl_minutes: i64) -> Result<(), CommandError> {
    let keys = TokenKeys::new(&jwt_secret_from_env()?);
    let store = connect().await?;
    let token = token_in(&store, &keys, email, ttl_minutes).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}

/// Print every user.
///
/// # Errors
///
/// Returns `CommandError` if the database fails.
pub async fn list() -> Result<(), CommandError> {
    let store = connect().await?;
    let users = store.list_users().await?;

    #[allow(clippy::print_stdout)]
    {
        for user in &users {
            let role = if user.is_admin { "admin" } else { "user" };
            println!("{:>6}  {role:<6}  {}", user.id.as_i32(), user.email);
        }
    }
    tracing::info!(count = users.len(), "Listed users");
    Ok(())
}
