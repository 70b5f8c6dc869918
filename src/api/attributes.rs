//! Tag and ingredient endpoints.
//!
//! Both collections behave the same, so each handler is generic over the
//! [`RecipeAttribute`] it serves and the router instantiates it per type.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::attribute;
use crate::db::{AttributeResponse, RecipeAttribute, UpdateAttributeRequest, User};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{parse_flag, validate_required_text};

#[derive(Debug, Default, Deserialize)]
pub struct ListAttributesQuery {
    pub assigned_only: Option<String>,
}

fn not_found<T: RecipeAttribute>() -> ApiError {
    ApiError::not_found(format!("{} not found", T::LABEL))
}

/// List the caller's tags or ingredients, ordered by name descending
///
/// GET /api/recipe/{tags,ingredients}/?assigned_only=1
pub async fn list_attributes<T: RecipeAttribute>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<ListAttributesQuery>,
) -> Result<Json<Vec<AttributeResponse>>, ApiError> {
    let assigned_only = match query.assigned_only.as_deref() {
        Some(value) => {
            parse_flag(value).map_err(|e| ApiError::validation_field("assigned_only", e))?
        }
        None => false,
    };

    let items = attribute::list_for_user::<T>(&state.db, user.id, assigned_only).await?;

    Ok(Json(
        items.iter().map(AttributeResponse::from_attribute).collect(),
    ))
}

/// GET /api/recipe/{tags,ingredients}/:id/
pub async fn get_attribute<T: RecipeAttribute>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<AttributeResponse>, ApiError> {
    let item = attribute::get_for_user::<T>(&state.db, id, user.id)
        .await?
        .ok_or_else(not_found::<T>)?;

    Ok(Json(AttributeResponse::from_attribute(&item)))
}

/// Partially update a tag or ingredient
///
/// PATCH /api/recipe/{tags,ingredients}/:id/
pub async fn update_attribute<T: RecipeAttribute>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAttributeRequest>,
) -> Result<Json<AttributeResponse>, ApiError> {
    let Some(name) = req.name else {
        // Nothing to change
        let item = attribute::get_for_user::<T>(&state.db, id, user.id)
            .await?
            .ok_or_else(not_found::<T>)?;
        return Ok(Json(AttributeResponse::from_attribute(&item)));
    };

    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required_text("Name", &name));
    errors.finish()?;

    let item = attribute::rename::<T>(&state.db, id, user.id, name.trim())
        .await?
        .ok_or_else(not_found::<T>)?;

    tracing::info!(
        user_id = user.id,
        id = item.id(),
        name = %item.name(),
        "{} renamed",
        T::LABEL
    );

    Ok(Json(AttributeResponse::from_attribute(&item)))
}

/// DELETE /api/recipe/{tags,ingredients}/:id/
pub async fn delete_attribute<T: RecipeAttribute>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !attribute::delete::<T>(&state.db, id, user.id).await? {
        return Err(not_found::<T>());
    }

    tracing::info!(user_id = user.id, id, "{} deleted", T::LABEL);

    Ok(StatusCode::NO_CONTENT)
}
