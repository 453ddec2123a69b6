use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(uuid(Customer::Id).primary_key())
                    .col(uuid(Customer::UserId).not_null().unique_key())
                    .col(string_len(Customer::StripeId, 255).not_null())
                    .col(string_len(Customer::FirstName, 100).not_null())
                    .col(string_len(Customer::LastName, 100).not_null())
                    .col(string_len(Customer::AddressLine1, 255).not_null())
                    .col(string_len_null(Customer::AddressLine2, 255))
                    .col(string_len(Customer::AddressCity, 100).not_null())
                    .col(string_len(Customer::AddressPostalCode, 20).not_null())
                    .col(string_len_null(Customer::AddressState, 100))
                    .col(string_len(Customer::AddressCountry, 2).not_null())
                    .col(string_len(Customer::Phone, 32).not_null())
                    .col(string_len_null(Customer::Passport, 32))
                    .col(
                        timestamp_with_time_zone(Customer::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Customer::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_user")
                            .from(Customer::Table, Customer::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customer::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customer {
    Table,
    Id,
    UserId,
    StripeId,
    FirstName,
    LastName,
    #[sea_orm(iden = "address_line1")]
    AddressLine1,
    #[sea_orm(iden = "address_line2")]
    AddressLine2,
    AddressCity,
    AddressPostalCode,
    AddressState,
    AddressCountry,
    Phone,
    Passport,
    CreatedAt,
    UpdatedAt,
}
