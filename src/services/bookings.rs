use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    sqlx, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, RuntimeErr,
    Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{car, car_media, customer, user};
use crate::error::{AppError, AppResult, ValidationError};
use crate::notifications::{BookingEmail, EmailTemplate};
use crate::services::availability;
use crate::services::customers::{validate_passport, CustomerDirectory, CustomerProfile};
use crate::AppState;

/// Name of the Postgres exclusion constraint guarding overlapping bookings.
pub const NO_OVERLAP_CONSTRAINT: &str = "booking_no_overlap";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingCommand {
    #[serde(alias = "car")]
    pub car_id: Uuid,
    pub email: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_cents: i64,
    #[serde(flatten)]
    pub customer: CustomerProfile,
}

#[derive(Debug, Clone, Copy)]
pub struct CancelBookingCommand {
    pub booking_id: Uuid,
    pub by_staff: bool,
}

/// Checks that need no database access, first failure wins.
pub fn validate_booking_request(
    price_cents: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    business_offset: &FixedOffset,
) -> Result<(), ValidationError> {
    if price_cents < 0 {
        return Err(ValidationError::NegativePrice);
    }
    if start <= now {
        return Err(ValidationError::StartDateInPast);
    }
    if end <= now {
        return Err(ValidationError::EndDateInPast);
    }
    if end <= start {
        return Err(ValidationError::EndBeforeStart);
    }

    let start_day = start.with_timezone(business_offset).date_naive();
    let today = now.with_timezone(business_offset).date_naive();
    if start_day == today {
        return Err(ValidationError::SameDayBooking);
    }

    Ok(())
}

fn violated_constraint(err: &DbErr) -> Option<&str> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))) => {
            db_err.constraint()
        }
        _ => None,
    }
}

fn map_overlap_violation(err: DbErr) -> AppError {
    if violated_constraint(&err) == Some(NO_OVERLAP_CONSTRAINT) {
        ValidationError::CarUnavailable.into()
    } else {
        err.into()
    }
}

/// Validates and stores a booking together with its user and customer.
///
/// The car row is locked for the duration of the transaction so that two
/// requests for the same car cannot both pass the availability check.
pub async fn create_booking(
    state: &AppState,
    cmd: CreateBookingCommand,
) -> AppResult<booking::Model> {
    validate_booking_request(
        cmd.price_cents,
        cmd.start_date,
        cmd.end_date,
        Utc::now(),
        &state.config.business_offset,
    )?;

    let txn = state.db.begin().await?;

    let car = car::Entity::find_by_id(cmd.car_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

    if !availability::is_available(&txn, car.id, cmd.start_date, cmd.end_date).await? {
        return Err(ValidationError::CarUnavailable.into());
    }

    let profile = cmd.customer.normalized();
    validate_passport(&profile)?;

    let customer = CustomerDirectory::from_state(state)
        .find_or_create(&txn, &cmd.email, &profile)
        .await?;

    let booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        car_id: Set(car.id),
        customer_id: Set(customer.id),
        start_date: Set(cmd.start_date.into()),
        end_date: Set(cmd.end_date.into()),
        price_cents: Set(cmd.price_cents),
        status: Set(BookingStatus::Unpaid),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await
    .map_err(map_overlap_violation)?;

    txn.commit().await.map_err(map_overlap_violation)?;

    tracing::info!(
        booking_id = %booking.id,
        car_id = %car.id,
        customer_id = %customer.id,
        "Booking created"
    );

    notify(state, EmailTemplate::BookingCreated, &booking).await;
    Ok(booking)
}

pub async fn find_booking<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Bookings newest first, optionally restricted to one customer.
pub async fn list_bookings<C: ConnectionTrait>(
    db: &C,
    customer_id: Option<Uuid>,
) -> AppResult<Vec<booking::Model>> {
    let mut query = booking::Entity::find();
    if let Some(customer_id) = customer_id {
        query = query.filter(booking::Column::CustomerId.eq(customer_id));
    }

    let bookings = query
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(bookings)
}

/// Reads a booking and holds its row until `txn` ends.
pub(crate) async fn lock_booking(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Moves `existing` to `next`, provided the stored status is still the one that was read.
pub(crate) async fn set_status(
    txn: &DatabaseTransaction,
    existing: booking::Model,
    next: BookingStatus,
) -> AppResult<booking::Model> {
    let result = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(next))
        .filter(booking::Column::Id.eq(existing.id))
        .filter(booking::Column::Status.eq(existing.status))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Booking status changed concurrently".to_string(),
        ));
    }

    Ok(booking::Model {
        status: next,
        ..existing
    })
}

pub async fn cancel_booking(
    state: &AppState,
    cmd: CancelBookingCommand,
) -> AppResult<booking::Model> {
    let txn = state.db.begin().await?;
    let existing = lock_booking(&txn, cmd.booking_id).await?;
    let status = existing.status.cancel(cmd.by_staff)?;
    let booking = set_status(&txn, existing, status).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, status = ?booking.status, "Booking canceled");

    notify(state, EmailTemplate::BookingCanceled, &booking).await;
    Ok(booking)
}

pub async fn mark_as_complete(
    db: &DatabaseConnection,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let txn = db.begin().await?;
    let existing = lock_booking(&txn, booking_id).await?;
    let status = existing.status.complete()?;
    let booking = set_status(&txn, existing, status).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, "Booking completed");
    Ok(booking)
}

pub async fn delete_booking<C: ConnectionTrait>(db: &C, booking_id: Uuid) -> AppResult<()> {
    let result = booking::Entity::delete_by_id(booking_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }
    tracing::info!(booking_id = %booking_id, "Booking deleted");
    Ok(())
}

/// Collects everything the booking templates render.
pub async fn booking_email<C: ConnectionTrait>(
    db: &C,
    booking: &booking::Model,
    currency: &str,
) -> AppResult<BookingEmail> {
    let (customer, user) = customer::Entity::find_by_id(booking.customer_id)
        .find_also_related(user::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    let user = user.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let car = car::Entity::find_by_id(booking.car_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

    let thumbnail = car_media::Entity::find()
        .filter(car_media::Column::CarId.eq(car.id))
        .filter(car_media::Column::IsThumbnail.eq(true))
        .one(db)
        .await?;

    Ok(BookingEmail {
        customer_email: user.email,
        customer_name: customer.name(),
        car_name: car.name(),
        car_thumbnail: thumbnail.map(|media| media.url),
        start_date: booking.start_date.with_timezone(&Utc),
        end_date: booking.end_date.with_timezone(&Utc),
        status: booking.status,
        price_cents: booking.price_cents,
        currency: currency.to_string(),
    })
}

/// Sends `template` for `booking`. Never fails the caller.
pub async fn notify(state: &AppState, template: EmailTemplate, booking: &booking::Model) {
    match booking_email(&state.db, booking, &state.config.payment.currency).await {
        Ok(data) => state.notifier.dispatch(template, &data).await,
        Err(err) => tracing::warn!(
            booking_id = %booking.id,
            template = template.name(),
            error = %err,
            "Failed to load booking email data"
        ),
    }
}
