use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::error::{AppError, AppResult};
use crate::services::payments;
use crate::AppState;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Payment provider notifications. The raw body is needed for signature checks.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<StatusCode> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    payments::handle_webhook(&state, &body, signature).await?;
    Ok(StatusCode::OK)
}
