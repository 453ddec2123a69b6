use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::users;
use crate::utils::jwt::create_token;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub is_staff: bool,
}

/// Login with email and password. Accounts without a password cannot log in.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = users::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    if !users::verify_password(&user, &payload.password) {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    let token = create_token(
        user.id,
        &user.email,
        user.is_staff,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            email: user.email,
            is_staff: user.is_staff,
        },
    }))
}
