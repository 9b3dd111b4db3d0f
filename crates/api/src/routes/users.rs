//! User route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::UserStore;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::state::AppState;

/// The authenticated user.
///
/// GET /users/me
pub async fn me(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}

/// All users, for admins.
///
/// GET /users/
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store().list_users().await?))
}
