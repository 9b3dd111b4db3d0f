//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while resolving a bearer token to a user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, algorithm or claim validation failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The `sub` claim is not a valid email.
    #[error("invalid subject: {0}")]
    InvalidSubject(#[from] stockroom_core::EmailError),

    /// The subject does not match any user.
    #[error("user not found")]
    UserNotFound,

    /// The requested lifetime puts the expiry out of range.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Whether the failure is the caller's fault (as opposed to a store failure).
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::ExpiryOutOfRange)
    }
}
