use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{booking, car_feature, car_media, user};
use crate::error::AppResult;
use crate::services::bookings;
use crate::services::cars::{self, CarDetails, CreateCarCommand, CreateMediaCommand, UpdateCarCommand};
use crate::services::users;
use crate::utils::jwt::create_token;
use crate::AppState;

// ============ Car Management ============

#[derive(Debug, Deserialize)]
pub struct SetFeaturesRequest {
    pub feature_ids: Vec<Uuid>,
}

pub async fn create_car(
    State(state): State<AppState>,
    Json(payload): Json<CreateCarCommand>,
) -> AppResult<(StatusCode, Json<CarDetails>)> {
    let car = cars::create_car(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn update_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Json(payload): Json<UpdateCarCommand>,
) -> AppResult<Json<CarDetails>> {
    Ok(Json(cars::update_car(&state.db, car_id, payload).await?))
}

/// Delete a car along with its media, feature links and bookings
pub async fn delete_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    cars::delete_car(&state.db, car_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_car_features(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Json(payload): Json<SetFeaturesRequest>,
) -> AppResult<Json<CarDetails>> {
    Ok(Json(
        cars::set_car_features(&state.db, car_id, &payload.feature_ids).await?,
    ))
}

// ============ Features & Media ============

#[derive(Debug, Deserialize)]
pub struct CreateFeatureRequest {
    pub name: String,
}

pub async fn create_feature(
    State(state): State<AppState>,
    Json(payload): Json<CreateFeatureRequest>,
) -> AppResult<(StatusCode, Json<car_feature::Model>)> {
    let feature = cars::create_feature(&state.db, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(feature)))
}

pub async fn delete_feature(
    State(state): State<AppState>,
    Path(feature_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    cars::delete_feature(&state.db, feature_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_media(
    State(state): State<AppState>,
    Json(payload): Json<CreateMediaCommand>,
) -> AppResult<(StatusCode, Json<car_media::Model>)> {
    let media = cars::create_media(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(media_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    cars::delete_media(&state.db, media_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ User Management ============

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<user::Model>>> {
    Ok(Json(users::list_users(&state.db).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<user::Model>)> {
    let user = users::create_user(
        &state.db,
        &payload.email,
        payload.password.as_deref(),
        payload.is_staff,
        payload.is_superuser,
    )
    .await?;

    tracing::info!(user_id = %user.id, is_staff = user.is_staff, "User created by staff");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Delete a user; the customer profile and its bookings go with it
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    users::delete_user(&state.db, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue an access token for any account, e.g. a magic link for a customer
pub async fn issue_token(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<TokenResponse>> {
    let user = users::find_by_id(&state.db, user_id).await?;
    let token = create_token(
        user.id,
        &user.email,
        user.is_staff,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    tracing::info!(user_id = %user.id, "Access token issued");
    Ok(Json(TokenResponse { token }))
}

// ============ Booking Management ============

pub async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    Ok(Json(bookings::mark_as_complete(&state.db, booking_id).await?))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    bookings::delete_booking(&state.db, booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
