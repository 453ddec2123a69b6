use sea_orm_migration::{
    prelude::*,
    schema::*,
    sea_orm::{ConnectionTrait, DatabaseBackend},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Car::Table)
                    .if_not_exists()
                    .col(uuid(Car::Id).primary_key())
                    .col(string_len(Car::Make, 50).not_null())
                    .col(string_len(Car::Model, 100).not_null())
                    .col(string_len(Car::Slug, 150).not_null().unique_key())
                    .col(integer(Car::Capacity).not_null())
                    .col(string_len(Car::Transmission, 2).not_null())
                    .col(string_len(Car::Drivetrain, 3).not_null())
                    .col(string_len(Car::FuelType, 4).not_null())
                    .col(double(Car::FuelConsumptionMetric).not_null())
                    .col(string_len(Car::EngineCode, 50).not_null())
                    .col(integer(Car::PowerHp).not_null())
                    .col(integer(Car::PowerMaxRpm).not_null())
                    .col(integer(Car::PriceHourlyCents).not_null())
                    .col(integer(Car::PriceThreeHoursCents).not_null())
                    .col(integer(Car::PriceSixHoursCents).not_null())
                    .col(integer(Car::PriceNineHoursCents).not_null())
                    .col(integer(Car::PriceTwelveHoursCents).not_null())
                    .col(integer(Car::PriceTwentyFourHoursCents).not_null())
                    .col(
                        timestamp_with_time_zone(Car::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Car::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CarFeature::Table)
                    .if_not_exists()
                    .col(uuid(CarFeature::Id).primary_key())
                    .col(string_len(CarFeature::Name, 25).not_null().unique_key())
                    .col(
                        timestamp_with_time_zone(CarFeature::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CarFeatureAssignment::Table)
                    .if_not_exists()
                    .col(uuid(CarFeatureAssignment::CarId).not_null())
                    .col(uuid(CarFeatureAssignment::CarFeatureId).not_null())
                    .primary_key(
                        Index::create()
                            .col(CarFeatureAssignment::CarId)
                            .col(CarFeatureAssignment::CarFeatureId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_feature_assignment_car")
                            .from(CarFeatureAssignment::Table, CarFeatureAssignment::CarId)
                            .to(Car::Table, Car::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_feature_assignment_feature")
                            .from(CarFeatureAssignment::Table, CarFeatureAssignment::CarFeatureId)
                            .to(CarFeature::Table, CarFeature::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CarMedia::Table)
                    .if_not_exists()
                    .col(uuid(CarMedia::Id).primary_key())
                    .col(uuid(CarMedia::CarId).not_null())
                    .col(string_len(CarMedia::Url, 2048).not_null())
                    .col(boolean(CarMedia::IsThumbnail).not_null().default(false))
                    .col(
                        timestamp_with_time_zone(CarMedia::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CarMedia::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_media_car")
                            .from(CarMedia::Table, CarMedia::CarId)
                            .to(Car::Table, Car::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One thumbnail per car
        if manager.get_database_backend() == DatabaseBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_car_media_one_thumbnail \
                     ON car_media (car_id) WHERE is_thumbnail",
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CarMedia::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CarFeatureAssignment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CarFeature::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Car::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Car {
    Table,
    Id,
    Make,
    Model,
    Slug,
    Capacity,
    Transmission,
    Drivetrain,
    FuelType,
    FuelConsumptionMetric,
    EngineCode,
    PowerHp,
    PowerMaxRpm,
    PriceHourlyCents,
    PriceThreeHoursCents,
    PriceSixHoursCents,
    PriceNineHoursCents,
    PriceTwelveHoursCents,
    PriceTwentyFourHoursCents,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum CarFeature {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum CarFeatureAssignment {
    Table,
    CarId,
    CarFeatureId,
}

#[derive(DeriveIden)]
pub enum CarMedia {
    Table,
    Id,
    CarId,
    Url,
    IsThumbnail,
    CreatedAt,
    UpdatedAt,
}
