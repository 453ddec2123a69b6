use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::error::AppResult;

/// Whether `car_id` has no live booking overlapping `[start, end)`.
///
/// Ranges that merely touch (`existing.end == start`) do not overlap.
/// Canceled bookings never block a slot.
pub async fn is_available<C: ConnectionTrait>(
    db: &C,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<bool> {
    let overlapping = booking::Entity::find()
        .filter(booking::Column::CarId.eq(car_id))
        .filter(booking::Column::StartDate.lt(end))
        .filter(booking::Column::EndDate.gt(start))
        .filter(booking::Column::Status.is_not_in(BookingStatus::CANCELED))
        .count(db)
        .await?;

    Ok(overlapping == 0)
}
