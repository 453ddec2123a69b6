use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking;
use crate::error::AppResult;
use crate::handlers::authorize_customer;
use crate::payments::PaymentIntentHandle;
use crate::services::bookings::{self, CancelBookingCommand, CreateBookingCommand};
use crate::services::customers::find_by_user;
use crate::services::payments;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub customer: Option<Uuid>,
}

/// Create a booking. Open to anonymous callers, the customer is resolved by email.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingCommand>,
) -> AppResult<(StatusCode, Json<booking::Model>)> {
    let booking = bookings::create_booking(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Staff see every booking, customers only their own
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<booking::Model>>> {
    if claims.is_staff {
        return Ok(Json(bookings::list_bookings(&state.db, query.customer).await?));
    }

    let Some(customer) = find_by_user(&state.db, claims.sub).await? else {
        return Ok(Json(Vec::new()));
    };

    Ok(Json(bookings::list_bookings(&state.db, Some(customer.id)).await?))
}

async fn authorized_booking(
    state: &AppState,
    claims: &Claims,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = bookings::find_booking(&state.db, booking_id).await?;
    authorize_customer(&state.db, claims, booking.customer_id).await?;
    Ok(booking)
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    Ok(Json(authorized_booking(&state, &claims, booking_id).await?))
}

/// Cancel a booking; staff callers cancel on behalf of the business
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    authorized_booking(&state, &claims, booking_id).await?;

    let booking = bookings::cancel_booking(
        &state,
        CancelBookingCommand {
            booking_id,
            by_staff: claims.is_staff,
        },
    )
    .await?;

    Ok(Json(booking))
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<PaymentIntentHandle>> {
    authorized_booking(&state, &claims, booking_id).await?;
    Ok(Json(payments::create_payment_intent(&state, booking_id).await?))
}
