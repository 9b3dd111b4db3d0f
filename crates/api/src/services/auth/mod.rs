//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user's email. The API never
//! issues tokens over HTTP; operators mint them with `stockroom user token`.

mod error;

pub use error::AuthError;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stockroom_core::Email;

use crate::db::UserStore;
use crate::models::User;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User email.
    pub sub: String,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    /// Build keys from the configured secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Mint a token for `email` that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExpiryOutOfRange` if `ttl` pushes the expiry past
    /// the representable range, or `AuthError::InvalidToken` if signing fails.
    pub fn issue(&self, email: &Email, ttl: Duration) -> Result<String, AuthError> {
        let expires = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: email.to_string(),
            exp: expires.timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` on a bad signature, wrong algorithm,
    /// or expired/missing claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Resolve a token to a stored user.
    ///
    /// # Errors
    ///
    /// Returns a credential error if the token is invalid or its subject
    /// is unknown, or `AuthError::Repository` if the lookup fails.
    pub async fn authenticate<U>(&self, users: &U, token: &str) -> Result<User, AuthError>
    where
        U: UserStore + ?Sized,
    {
        let claims = self.verify(token)?;
        let email = Email::parse(&claims.sub)?;
        let user = users
            .user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        debug!(user_id = %user.id, "Token authenticated");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("k3y-for-unit-tests-only-9f8e7d6c5b4a3210"))
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys();
        let email = Email::parse("buyer@shop.example").unwrap();
        let token = keys.issue(&email, Duration::minutes(5)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "buyer@shop.example");
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let email = Email::parse("buyer@shop.example").unwrap();
        let token = keys.issue(&email, Duration::hours(-1)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_issue_rejects_unrepresentable_expiry() {
        let email = Email::parse("buyer@shop.example").unwrap();
        let err = keys()
            .issue(&email, Duration::days(365 * 1_000_000))
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiryOutOfRange));
        assert!(!err.is_credential_error());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = TokenKeys::new(&SecretString::from("another-secret-entirely-0123456789abcdef"));
        let email = Email::parse("buyer@shop.example").unwrap();
        let token = other.issue(&email, Duration::minutes(5)).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[tokio::test]
    async fn test_authenticate_requires_known_user() {
        let keys = keys();
        let store = MemoryStore::new();
        let email = Email::parse("buyer@shop.example").unwrap();
        let token = keys.issue(&email, Duration::minutes(5)).unwrap();

        let err = keys.authenticate(&store, &token).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
        assert!(err.is_credential_error());

        store.create_user(&email, false).await.unwrap();
        let user = keys.authenticate(&store, &token).await.unwrap();
        assert_eq!(user.email, email);
    }
}
