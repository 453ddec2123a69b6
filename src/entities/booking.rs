use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELED_BY_STAFF")]
    CanceledByStaff,
    #[sea_orm(string_value = "CANCELED_BY_CUSTOMER")]
    CanceledByCustomer,
}

impl BookingStatus {
    pub const CANCELED: [BookingStatus; 2] =
        [BookingStatus::CanceledByStaff, BookingStatus::CanceledByCustomer];

    pub fn is_canceled(&self) -> bool {
        Self::CANCELED.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        *self == BookingStatus::Completed || self.is_canceled()
    }

    /// Status after a cancellation request, or the rule that forbids it.
    pub fn cancel(&self, by_staff: bool) -> Result<BookingStatus, ValidationError> {
        match self {
            BookingStatus::Completed => Err(ValidationError::CancelCompleted),
            status if status.is_canceled() => Err(ValidationError::AlreadyCanceled),
            _ if by_staff => Ok(BookingStatus::CanceledByStaff),
            _ => Ok(BookingStatus::CanceledByCustomer),
        }
    }

    pub fn complete(&self) -> Result<BookingStatus, ValidationError> {
        match self {
            BookingStatus::Completed => Err(ValidationError::AlreadyCompleted),
            status if status.is_canceled() => Err(ValidationError::CompleteCanceled),
            _ => Ok(BookingStatus::Completed),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: DateTimeWithTimeZone,
    pub price_cents: i64,
    pub status: BookingStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id",
        on_delete = "Cascade"
    )]
    Car,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "Cascade"
    )]
    Customer,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_open_bookings() {
        for status in [
            BookingStatus::Unpaid,
            BookingStatus::Confirmed,
            BookingStatus::Active,
        ] {
            assert_eq!(status.cancel(false), Ok(BookingStatus::CanceledByCustomer));
            assert_eq!(status.cancel(true), Ok(BookingStatus::CanceledByStaff));
        }
    }

    #[test]
    fn test_cancel_terminal_bookings_fails() {
        assert_eq!(
            BookingStatus::Completed.cancel(true),
            Err(ValidationError::CancelCompleted)
        );
        assert_eq!(
            BookingStatus::CanceledByStaff.cancel(false),
            Err(ValidationError::AlreadyCanceled)
        );
        assert_eq!(
            BookingStatus::CanceledByCustomer.cancel(true),
            Err(ValidationError::AlreadyCanceled)
        );
    }

    #[test]
    fn test_complete_guards_terminal_states() {
        assert_eq!(BookingStatus::Active.complete(), Ok(BookingStatus::Completed));
        assert_eq!(BookingStatus::Unpaid.complete(), Ok(BookingStatus::Completed));
        assert_eq!(
            BookingStatus::Completed.complete(),
            Err(ValidationError::AlreadyCompleted)
        );
        assert_eq!(
            BookingStatus::CanceledByCustomer.complete(),
            Err(ValidationError::CompleteCanceled)
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::CanceledByStaff.is_terminal());
        assert!(!BookingStatus::Active.is_terminal());
        assert!(!BookingStatus::Unpaid.is_terminal());
    }
}
