use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::entities::customer;
use crate::error::{AppError, AppResult};
use crate::handlers::authorize_customer;
use crate::services::customers::{find_by_user, CustomerDirectory, CustomerPatch};
use crate::utils::jwt::Claims;
use crate::AppState;

/// Customer profile of the signed-in user
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<customer::Model>> {
    let customer = find_by_user(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("No customer profile for this account".to_string()))?;

    Ok(Json(customer))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<customer::Model>> {
    let customer = authorize_customer(&state.db, &claims, customer_id).await?;
    Ok(Json(customer))
}

/// Partial profile update, mirrored to the payment account first
pub async fn update_customer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(customer_id): Path<Uuid>,
    Json(patch): Json<CustomerPatch>,
) -> AppResult<Json<customer::Model>> {
    authorize_customer(&state.db, &claims, customer_id).await?;

    let customer = CustomerDirectory::from_state(&state)
        .patch(&state.db, customer_id, patch)
        .await?;

    Ok(Json(customer))
}
