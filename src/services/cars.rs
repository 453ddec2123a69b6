use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::entities::car::{self, CarMake, Drivetrain, FuelType, Transmission};
use crate::entities::car_feature::{self, CarFeatureKind};
use crate::entities::{car_feature_assignment, car_media};
use crate::error::{AppError, AppResult, ValidationError};
use crate::utils::slug::slugify;

/// Price table in cents, keyed by rental duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarPrices {
    pub price_hourly_cents: i32,
    pub price_three_hours_cents: i32,
    pub price_six_hours_cents: i32,
    pub price_nine_hours_cents: i32,
    pub price_twelve_hours_cents: i32,
    pub price_twenty_four_hours_cents: i32,
}

impl CarPrices {
    fn all(&self) -> [i32; 6] {
        [
            self.price_hourly_cents,
            self.price_three_hours_cents,
            self.price_six_hours_cents,
            self.price_nine_hours_cents,
            self.price_twelve_hours_cents,
            self.price_twenty_four_hours_cents,
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCarCommand {
    pub make: CarMake,
    pub model: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub capacity: i32,
    pub transmission: Transmission,
    pub drivetrain: Drivetrain,
    pub fuel_type: FuelType,
    pub fuel_consumption_metric: f64,
    pub engine_code: String,
    pub power_hp: i32,
    pub power_max_rpm: i32,
    #[serde(flatten)]
    pub prices: CarPrices,
    #[serde(default, alias = "features")]
    pub feature_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCarCommand {
    pub make: Option<CarMake>,
    pub model: Option<String>,
    pub slug: Option<String>,
    pub capacity: Option<i32>,
    pub transmission: Option<Transmission>,
    pub drivetrain: Option<Drivetrain>,
    pub fuel_type: Option<FuelType>,
    pub fuel_consumption_metric: Option<f64>,
    pub engine_code: Option<String>,
    pub power_hp: Option<i32>,
    pub power_max_rpm: Option<i32>,
    pub prices: Option<CarPrices>,
    #[serde(alias = "features")]
    pub feature_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMediaCommand {
    #[serde(alias = "car")]
    pub car_id: Uuid,
    pub url: String,
    #[serde(default)]
    pub is_thumbnail: bool,
}

/// A car as listed to the public.
#[derive(Debug, Clone, Serialize)]
pub struct CarDetails {
    #[serde(flatten)]
    pub car: car::Model,
    pub name: String,
    pub features: Vec<CarFeatureKind>,
    pub thumbnail_url: Option<String>,
}

fn validate_specs(capacity: i32, prices: &CarPrices) -> AppResult<()> {
    if capacity <= 0 {
        return Err(AppError::BadRequest("Capacity must be positive".to_string()));
    }
    if prices.all().iter().any(|price| *price < 0) {
        return Err(AppError::BadRequest("Prices cannot be negative".to_string()));
    }
    Ok(())
}

fn slug_conflict(err: sea_orm::DbErr, slug: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("A car with slug {} already exists", slug))
        }
        _ => err.into(),
    }
}

// ============ Cars ============

pub async fn create_car(db: &DatabaseConnection, cmd: CreateCarCommand) -> AppResult<CarDetails> {
    validate_specs(cmd.capacity, &cmd.prices)?;

    let slug = cmd
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&car::car_name(cmd.make, &cmd.model)));

    let now = Utc::now();
    let txn = db.begin().await?;

    let car = car::ActiveModel {
        id: Set(Uuid::new_v4()),
        make: Set(cmd.make),
        model: Set(cmd.model),
        slug: Set(slug.clone()),
        capacity: Set(cmd.capacity),
        transmission: Set(cmd.transmission),
        drivetrain: Set(cmd.drivetrain),
        fuel_type: Set(cmd.fuel_type),
        fuel_consumption_metric: Set(cmd.fuel_consumption_metric),
        engine_code: Set(cmd.engine_code),
        power_hp: Set(cmd.power_hp),
        power_max_rpm: Set(cmd.power_max_rpm),
        price_hourly_cents: Set(cmd.prices.price_hourly_cents),
        price_three_hours_cents: Set(cmd.prices.price_three_hours_cents),
        price_six_hours_cents: Set(cmd.prices.price_six_hours_cents),
        price_nine_hours_cents: Set(cmd.prices.price_nine_hours_cents),
        price_twelve_hours_cents: Set(cmd.prices.price_twelve_hours_cents),
        price_twenty_four_hours_cents: Set(cmd.prices.price_twenty_four_hours_cents),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| slug_conflict(err, &slug))?;

    replace_features(&txn, car.id, &cmd.feature_ids).await?;
    txn.commit().await?;

    tracing::info!(car_id = %car.id, slug = %car.slug, "Car created");
    get_car(db, car.id).await
}

pub async fn update_car(
    db: &DatabaseConnection,
    id: Uuid,
    cmd: UpdateCarCommand,
) -> AppResult<CarDetails> {
    let existing = find_car(db, id).await?;

    let capacity = cmd.capacity.unwrap_or(existing.capacity);
    let prices = cmd.prices.unwrap_or(CarPrices {
        price_hourly_cents: existing.price_hourly_cents,
        price_three_hours_cents: existing.price_three_hours_cents,
        price_six_hours_cents: existing.price_six_hours_cents,
        price_nine_hours_cents: existing.price_nine_hours_cents,
        price_twelve_hours_cents: existing.price_twelve_hours_cents,
        price_twenty_four_hours_cents: existing.price_twenty_four_hours_cents,
    });
    validate_specs(capacity, &prices)?;

    let slug = match cmd.slug.as_deref().map(slugify).filter(|s| !s.is_empty()) {
        Some(slug) => slug,
        None => existing.slug.clone(),
    };

    let txn = db.begin().await?;
    let mut active: car::ActiveModel = existing.into();
    if let Some(make) = cmd.make {
        active.make = Set(make);
    }
    if let Some(model) = cmd.model {
        active.model = Set(model);
    }
    if let Some(transmission) = cmd.transmission {
        active.transmission = Set(transmission);
    }
    if let Some(drivetrain) = cmd.drivetrain {
        active.drivetrain = Set(drivetrain);
    }
    if let Some(fuel_type) = cmd.fuel_type {
        active.fuel_type = Set(fuel_type);
    }
    if let Some(consumption) = cmd.fuel_consumption_metric {
        active.fuel_consumption_metric = Set(consumption);
    }
    if let Some(engine_code) = cmd.engine_code {
        active.engine_code = Set(engine_code);
    }
    if let Some(power_hp) = cmd.power_hp {
        active.power_hp = Set(power_hp);
    }
    if let Some(power_max_rpm) = cmd.power_max_rpm {
        active.power_max_rpm = Set(power_max_rpm);
    }
    active.slug = Set(slug.clone());
    active.capacity = Set(capacity);
    active.price_hourly_cents = Set(prices.price_hourly_cents);
    active.price_three_hours_cents = Set(prices.price_three_hours_cents);
    active.price_six_hours_cents = Set(prices.price_six_hours_cents);
    active.price_nine_hours_cents = Set(prices.price_nine_hours_cents);
    active.price_twelve_hours_cents = Set(prices.price_twelve_hours_cents);
    active.price_twenty_four_hours_cents = Set(prices.price_twenty_four_hours_cents);
    active.updated_at = Set(Utc::now().into());

    let car = active
        .update(&txn)
        .await
        .map_err(|err| slug_conflict(err, &slug))?;

    if let Some(feature_ids) = cmd.feature_ids {
        replace_features(&txn, car.id, &feature_ids).await?;
    }
    txn.commit().await?;

    tracing::info!(car_id = %car.id, "Car updated");
    get_car(db, car.id).await
}

/// Removes the car with its media, feature links and bookings.
pub async fn delete_car<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<()> {
    let result = car::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Car not found".to_string()));
    }
    tracing::info!(car_id = %id, "Car deleted");
    Ok(())
}

pub async fn find_car<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<car::Model> {
    car::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))
}

pub async fn get_car<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<CarDetails> {
    let car = find_car(db, id).await?;
    details(db, car).await
}

pub async fn get_car_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> AppResult<CarDetails> {
    let car = car::Entity::find()
        .filter(car::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;
    details(db, car).await
}

/// The whole fleet, cheapest daily rate first.
pub async fn list_cars<C: ConnectionTrait>(db: &C) -> AppResult<Vec<CarDetails>> {
    let cars = car::Entity::find()
        .find_with_related(car_feature::Entity)
        .all(db)
        .await?;

    let thumbnails: HashMap<Uuid, String> = car_media::Entity::find()
        .filter(car_media::Column::IsThumbnail.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|media| (media.car_id, media.url))
        .collect();

    let mut listed: Vec<CarDetails> = cars
        .into_iter()
        .map(|(car, features)| CarDetails {
            name: car.name(),
            features: feature_kinds(features),
            thumbnail_url: thumbnails.get(&car.id).cloned(),
            car,
        })
        .collect();

    listed.sort_by(|a, b| {
        a.car
            .price_twenty_four_hours_cents
            .cmp(&b.car.price_twenty_four_hours_cents)
            .then_with(|| a.car.slug.cmp(&b.car.slug))
    });
    Ok(listed)
}

async fn details<C: ConnectionTrait>(db: &C, car: car::Model) -> AppResult<CarDetails> {
    let features = car_feature::Entity::find()
        .join(JoinType::InnerJoin, car_feature::Relation::Assignments.def())
        .filter(car_feature_assignment::Column::CarId.eq(car.id))
        .all(db)
        .await?;

    let thumbnail = car_media::Entity::find()
        .filter(car_media::Column::CarId.eq(car.id))
        .filter(car_media::Column::IsThumbnail.eq(true))
        .one(db)
        .await?;

    Ok(CarDetails {
        name: car.name(),
        features: feature_kinds(features),
        thumbnail_url: thumbnail.map(|media| media.url),
        car,
    })
}

fn feature_kinds(features: Vec<car_feature::Model>) -> Vec<CarFeatureKind> {
    let mut kinds: Vec<CarFeatureKind> = features.into_iter().map(|f| f.name).collect();
    kinds.sort_by_key(|kind| kind.to_value());
    kinds
}

// ============ Features ============

pub async fn create_feature<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<car_feature::Model> {
    let kind = CarFeatureKind::from_name(name.trim()).ok_or(ValidationError::InvalidFeature)?;

    car_feature::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(kind),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("Feature {} already exists", kind.to_value()))
        }
        _ => err.into(),
    })
}

pub async fn list_features<C: ConnectionTrait>(db: &C) -> AppResult<Vec<car_feature::Model>> {
    let features = car_feature::Entity::find()
        .order_by_asc(car_feature::Column::Name)
        .all(db)
        .await?;
    Ok(features)
}

pub async fn delete_feature<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<()> {
    let result = car_feature::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Feature not found".to_string()));
    }
    Ok(())
}

/// Replaces the feature set of `car_id` with `feature_ids`.
pub async fn set_car_features(
    db: &DatabaseConnection,
    car_id: Uuid,
    feature_ids: &[Uuid],
) -> AppResult<CarDetails> {
    find_car(db, car_id).await?;

    let txn = db.begin().await?;
    replace_features(&txn, car_id, feature_ids).await?;
    txn.commit().await?;

    get_car(db, car_id).await
}

async fn replace_features<C: ConnectionTrait>(
    db: &C,
    car_id: Uuid,
    feature_ids: &[Uuid],
) -> AppResult<()> {
    let mut ids = feature_ids.to_vec();
    ids.sort();
    ids.dedup();

    if !ids.is_empty() {
        let found = car_feature::Entity::find()
            .filter(car_feature::Column::Id.is_in(ids.clone()))
            .count(db)
            .await?;
        if found != ids.len() as u64 {
            return Err(AppError::BadRequest("Unknown car feature id".to_string()));
        }
    }

    car_feature_assignment::Entity::delete_many()
        .filter(car_feature_assignment::Column::CarId.eq(car_id))
        .exec(db)
        .await?;

    if ids.is_empty() {
        return Ok(());
    }

    let assignments = ids.into_iter().map(|feature_id| car_feature_assignment::ActiveModel {
        car_id: Set(car_id),
        car_feature_id: Set(feature_id),
    });
    car_feature_assignment::Entity::insert_many(assignments)
        .exec_without_returning(db)
        .await?;

    tracing::debug!(car_id = %car_id, "Car features replaced");
    Ok(())
}

// ============ Media ============

fn validate_media_url(raw: &str) -> AppResult<String> {
    let url = Url::parse(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid media url: {}", raw)))?;

    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        scheme => Err(AppError::BadRequest(format!(
            "Unsupported media url scheme: {}",
            scheme
        ))),
    }
}

/// Adds a media item. A second thumbnail for the same car is rejected,
/// the current one is never demoted.
pub async fn create_media<C: ConnectionTrait>(
    db: &C,
    cmd: CreateMediaCommand,
) -> AppResult<car_media::Model> {
    let url = validate_media_url(&cmd.url)?;
    find_car(db, cmd.car_id).await?;

    if cmd.is_thumbnail {
        let thumbnails = car_media::Entity::find()
            .filter(car_media::Column::CarId.eq(cmd.car_id))
            .filter(car_media::Column::IsThumbnail.eq(true))
            .count(db)
            .await?;
        if thumbnails > 0 {
            return Err(ValidationError::MultipleThumbnails.into());
        }
    }

    let now = Utc::now();
    let media = car_media::ActiveModel {
        id: Set(Uuid::new_v4()),
        car_id: Set(cmd.car_id),
        url: Set(url),
        is_thumbnail: Set(cmd.is_thumbnail),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ValidationError::MultipleThumbnails.into(),
        _ => AppError::from(err),
    })?;

    tracing::info!(car_id = %media.car_id, media_id = %media.id, "Car media created");
    Ok(media)
}

pub async fn list_media<C: ConnectionTrait>(
    db: &C,
    car_id: Option<Uuid>,
) -> AppResult<Vec<car_media::Model>> {
    let mut query = car_media::Entity::find();
    if let Some(car_id) = car_id {
        query = query.filter(car_media::Column::CarId.eq(car_id));
    }

    let media = query
        .order_by_desc(car_media::Column::IsThumbnail)
        .order_by_asc(car_media::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(media)
}

pub async fn delete_media<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<()> {
    let result = car_media::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Media not found".to_string()));
    }
    Ok(())
}
