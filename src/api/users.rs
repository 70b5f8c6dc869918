//! User registration, token issuance and profile endpoints.

use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::db::{
    CreateUserRequest, Session, TokenRequest, TokenResponse, UpdateUserRequest, User, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_required_text};

/// Register a new user
///
/// POST /api/user/create/
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("email", validate_email(&req.email));
    errors.check(
        "password",
        validate_password(&req.password, state.config.auth.min_password_length),
    );
    errors.finish()?;

    let user = User::create(&state.db, &req.email, &req.password, req.name.trim()).await?;

    tracing::info!(user_id = user.id, email = %user.email, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Exchange credentials for an auth token
///
/// POST /api/user/token/
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || {
        ApiError::validation_field(
            "non_field_errors",
            "Unable to authenticate with provided credentials",
        )
    };

    let user = User::get_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active || !user.check_password(&req.password) {
        return Err(invalid());
    }

    let token = Session::issue(&state.db, user.id, state.config.auth.session_ttl_days).await?;

    tracing::debug!(user_id = user.id, "Token issued");

    Ok(Json(TokenResponse { token }))
}

/// Profile of the authenticated user
///
/// GET /api/user/me/
pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Update the authenticated user's name and/or password
///
/// PATCH /api/user/me/
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required_text("Name", name));
    }
    if let Some(ref password) = req.password {
        errors.check(
            "password",
            validate_password(password, state.config.auth.min_password_length),
        );
    }
    errors.finish()?;

    let updated = User::update(
        &state.db,
        user.id,
        req.name.as_deref().map(str::trim),
        req.password.as_deref(),
    )
    .await?;

    tracing::info!(user_id = updated.id, "User profile updated");

    Ok(Json(UserResponse::from(updated)))
}
