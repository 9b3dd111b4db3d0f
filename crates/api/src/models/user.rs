//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{Email, UserId};

/// A registered user.
///
/// Users are created by operators (see the CLI); the API only looks them up
/// from the subject of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (the token subject).
    pub email: Email,
    /// Whether the user may manage the catalog and see every order.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may read an order owned by `owner`.
    #[must_use]
    pub fn can_view_order_of(&self, owner: UserId) -> bool {
        self.is_admin || self.id == owner
    }
}
