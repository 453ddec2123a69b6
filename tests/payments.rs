mod common;

use sea_orm::EntityTrait;
use serde_json::json;

use car_rental_backend::entities::booking::{self, BookingStatus};
use car_rental_backend::error::AppError;
use car_rental_backend::services::bookings::{cancel_booking, create_booking, CancelBookingCommand};
use car_rental_backend::services::payments::{create_payment_intent, handle_webhook};

use common::{booking_command, create_car, slot, TestContext, VALID_SIGNATURE};

async fn booked(ctx: &TestContext) -> booking::Model {
    let car = create_car(ctx, "Civic").await;
    create_booking(
        &ctx.state,
        booking_command(car.car.id, "jane@example.com", slot(0), slot(6)),
    )
    .await
    .unwrap()
}

fn event(event_type: &str, booking: &booking::Model) -> String {
    json!({ "type": event_type, "bookingId": booking.id.to_string() }).to_string()
}

async fn status(ctx: &TestContext, booking: &booking::Model) -> Option<BookingStatus> {
    booking::Entity::find_by_id(booking.id)
        .one(ctx.db())
        .await
        .unwrap()
        .map(|b| b.status)
}

#[tokio::test]
async fn test_payment_intent_carries_booking_reference() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;

    let handle = create_payment_intent(&ctx.state, booking.id).await.unwrap();
    assert!(handle.client_secret.is_some());

    let request = ctx.payments.intents.lock().unwrap()[0].clone();
    assert_eq!(request.booking_id, booking.id);
    assert_eq!(request.amount_cents, 3000);
    assert_eq!(request.currency, "thb");
    assert_eq!(request.account_id, "cus_test_0");

    // Intent creation alone does not move the booking
    assert_eq!(status(&ctx, &booking).await, Some(BookingStatus::Unpaid));
}

#[tokio::test]
async fn test_succeeded_event_activates_booking() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;

    handle_webhook(
        &ctx.state,
        &event("payment_intent.succeeded", &booking),
        VALID_SIGNATURE,
    )
    .await
    .unwrap();

    assert_eq!(status(&ctx, &booking).await, Some(BookingStatus::Active));
    assert_eq!(
        ctx.mailer.templates(),
        vec!["booking-created", "booking-confirmed"]
    );

    // Redelivery is a no-op
    handle_webhook(
        &ctx.state,
        &event("payment_intent.succeeded", &booking),
        VALID_SIGNATURE,
    )
    .await
    .unwrap();
    assert_eq!(ctx.mailer.templates().len(), 2);
}

#[tokio::test]
async fn test_succeeded_event_leaves_canceled_booking_alone() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;
    cancel_booking(
        &ctx.state,
        CancelBookingCommand {
            booking_id: booking.id,
            by_staff: false,
        },
    )
    .await
    .unwrap();

    handle_webhook(
        &ctx.state,
        &event("payment_intent.succeeded", &booking),
        VALID_SIGNATURE,
    )
    .await
    .unwrap();

    assert_eq!(
        status(&ctx, &booking).await,
        Some(BookingStatus::CanceledByCustomer)
    );
}

#[tokio::test]
async fn test_canceled_event_deletes_booking() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;

    handle_webhook(
        &ctx.state,
        &event("payment_intent.canceled", &booking),
        VALID_SIGNATURE,
    )
    .await
    .unwrap();
    assert_eq!(status(&ctx, &booking).await, None);

    let err = handle_webhook(
        &ctx.state,
        &event("payment_intent.canceled", &booking),
        VALID_SIGNATURE,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_bad_signature_changes_nothing() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;

    let err = handle_webhook(
        &ctx.state,
        &event("payment_intent.succeeded", &booking),
        "forged",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(status(&ctx, &booking).await, Some(BookingStatus::Unpaid));
}

#[tokio::test]
async fn test_other_events_are_ignored() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;

    handle_webhook(
        &ctx.state,
        &event("charge.refunded", &booking),
        VALID_SIGNATURE,
    )
    .await
    .unwrap();

    assert_eq!(status(&ctx, &booking).await, Some(BookingStatus::Unpaid));
}

#[tokio::test]
async fn test_cancel_racing_payment_stays_canceled() {
    let ctx = TestContext::new().await;
    let booking = booked(&ctx).await;
    let payload = event("payment_intent.succeeded", &booking);

    let (canceled, paid) = tokio::join!(
        cancel_booking(
            &ctx.state,
            CancelBookingCommand {
                booking_id: booking.id,
                by_staff: false,
            },
        ),
        handle_webhook(&ctx.state, &payload, VALID_SIGNATURE),
    );

    // Whichever transition runs second sees the first one's status
    let canceled = canceled.unwrap();
    paid.unwrap();
    assert_eq!(canceled.status, BookingStatus::CanceledByCustomer);
    assert_eq!(
        status(&ctx, &booking).await,
        Some(BookingStatus::CanceledByCustomer)
    );
}
