use sea_orm_migration::{
    prelude::*,
    schema::*,
    sea_orm::{ConnectionTrait, DatabaseBackend},
};

use super::m20260301_000002_create_customers::Customer;
use super::m20260301_000003_create_cars::Car;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CarId).not_null())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(timestamp_with_time_zone(Booking::StartDate).not_null())
                    .col(timestamp_with_time_zone(Booking::EndDate).not_null())
                    .col(big_integer(Booking::PriceCents).not_null())
                    .col(
                        string_len(Booking::Status, 32)
                            .not_null()
                            .default("UNPAID"),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_car")
                            .from(Booking::Table, Booking::CarId)
                            .to(Car::Table, Car::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_car_range")
                    .table(Booking::Table)
                    .col(Booking::CarId)
                    .col(Booking::StartDate)
                    .col(Booking::EndDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Live bookings of one car may not overlap
        if manager.get_database_backend() == DatabaseBackend::Postgres {
            let db = manager.get_connection();
            db.execute_unprepared("CREATE EXTENSION IF NOT EXISTS btree_gist")
                .await?;
            db.execute_unprepared(
                "ALTER TABLE booking ADD CONSTRAINT booking_no_overlap \
                 EXCLUDE USING gist (car_id WITH =, tstzrange(start_date, end_date, '[)') WITH &&) \
                 WHERE (status NOT IN ('CANCELED_BY_STAFF', 'CANCELED_BY_CUSTOMER'))",
            )
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    CarId,
    CustomerId,
    StartDate,
    EndDate,
    PriceCents,
    Status,
    CreatedAt,
}
