use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::customer;
use crate::error::{AppError, AppResult};
use crate::notifications::EmailTemplate;
use crate::payments::{with_retry, PaymentEvent, PaymentIntentHandle, PaymentIntentRequest};
use crate::services::bookings::{self, delete_booking, find_booking, lock_booking, set_status};
use crate::AppState;

/// Asks the provider to collect the booking price. The booking is unchanged
/// until the provider reports the outcome through the webhook.
pub async fn create_payment_intent(
    state: &AppState,
    booking_id: Uuid,
) -> AppResult<PaymentIntentHandle> {
    let booking = find_booking(&state.db, booking_id).await?;
    let customer = customer::Entity::find_by_id(booking.customer_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let request = PaymentIntentRequest {
        amount_cents: booking.price_cents,
        currency: state.config.payment.currency.clone(),
        account_id: customer.stripe_id,
        booking_id: booking.id,
    };

    let handle = with_retry(1, state.config.payment.timeout, || {
        state.payments.create_payment_intent(&request)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.id,
        payment_intent_id = %handle.payment_intent_id,
        "Payment intent created"
    );
    Ok(handle)
}

/// Verifies and applies a provider notification.
pub async fn handle_webhook(state: &AppState, payload: &str, signature: &str) -> AppResult<()> {
    let event = state
        .payments
        .parse_event(payload, signature)
        .inspect_err(|err| tracing::warn!(error = %err, "Rejected payment webhook"))?;

    handle_payment_event(state, event).await
}

pub async fn handle_payment_event(state: &AppState, event: PaymentEvent) -> AppResult<()> {
    match event {
        PaymentEvent::Succeeded { booking_id } => mark_as_paid(state, booking_id).await,
        PaymentEvent::Canceled { booking_id } => delete_booking(&state.db, booking_id).await,
        PaymentEvent::Other { event_type } => {
            tracing::info!(event_type = %event_type, "Ignoring payment event");
            Ok(())
        }
    }
}

async fn mark_as_paid(state: &AppState, booking_id: Uuid) -> AppResult<()> {
    let txn = state.db.begin().await?;
    let existing = lock_booking(&txn, booking_id).await?;

    if existing.status == BookingStatus::Active {
        tracing::debug!(booking_id = %booking_id, "Booking already active");
        return Ok(());
    }
    if existing.status.is_terminal() {
        tracing::warn!(
            booking_id = %booking_id,
            status = ?existing.status,
            "Payment succeeded for a closed booking"
        );
        return Ok(());
    }

    let booking = set_status(&txn, existing, BookingStatus::Active).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, "Booking paid");

    bookings::notify(state, EmailTemplate::BookingConfirmed, &booking).await;
    Ok(())
}
