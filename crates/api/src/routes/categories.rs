//! Category route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::db::CatalogStore;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::state::AppState;

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

/// List all categories.
///
/// GET /categories/
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.store().list_categories().await?))
}

/// Create a category. Duplicate names are a 409.
///
/// POST /categories/
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Category name cannot be empty".to_owned(),
        ));
    }

    let category = state.store().create_category(name).await?;
    info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}
