use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarMake {
    #[sea_orm(string_value = "HONDA")]
    Honda,
    #[sea_orm(string_value = "MAZDA")]
    Mazda,
    #[sea_orm(string_value = "MITSUBISHI")]
    Mitsubishi,
    #[sea_orm(string_value = "SUBARU")]
    Subaru,
}

impl CarMake {
    pub fn label(&self) -> &'static str {
        match self {
            CarMake::Honda => "Honda",
            CarMake::Mazda => "Mazda",
            CarMake::Mitsubishi => "Mitsubishi",
            CarMake::Subaru => "Subaru",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
pub enum Transmission {
    #[sea_orm(string_value = "AT")]
    #[serde(rename = "AT")]
    Automatic,
    #[sea_orm(string_value = "MT")]
    #[serde(rename = "MT")]
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
pub enum Drivetrain {
    #[sea_orm(string_value = "AWD")]
    #[serde(rename = "AWD")]
    AllWheel,
    #[sea_orm(string_value = "4WD")]
    #[serde(rename = "4WD")]
    FourWheel,
    #[sea_orm(string_value = "FWD")]
    #[serde(rename = "FWD")]
    FrontWheel,
    #[sea_orm(string_value = "RWD")]
    #[serde(rename = "RWD")]
    RearWheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(4))")]
pub enum FuelType {
    #[sea_orm(string_value = "B")]
    #[serde(rename = "B")]
    Benzine,
    #[sea_orm(string_value = "G91")]
    #[serde(rename = "G91")]
    Gasohol91,
    #[sea_orm(string_value = "G95")]
    #[serde(rename = "G95")]
    Gasohol95,
    #[sea_orm(string_value = "GE20")]
    #[serde(rename = "GE20")]
    GasoholE20,
    #[sea_orm(string_value = "GE85")]
    #[serde(rename = "GE85")]
    GasoholE85,
    #[sea_orm(string_value = "PB")]
    #[serde(rename = "PB")]
    PremiumBenzine,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "car")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub make: CarMake,
    pub model: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub capacity: i32,
    pub transmission: Transmission,
    pub drivetrain: Drivetrain,
    pub fuel_type: FuelType,
    /// Liters per 100km.
    pub fuel_consumption_metric: f64,
    pub engine_code: String,
    pub power_hp: i32,
    pub power_max_rpm: i32,
    pub price_hourly_cents: i32,
    pub price_three_hours_cents: i32,
    pub price_six_hours_cents: i32,
    pub price_nine_hours_cents: i32,
    pub price_twelve_hours_cents: i32,
    pub price_twenty_four_hours_cents: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn name(&self) -> String {
        car_name(self.make, &self.model)
    }
}

pub fn car_name(make: CarMake, model: &str) -> String {
    format!("{} {}", make.label(), model)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::car_media::Entity")]
    Media,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::car_feature_assignment::Entity")]
    FeatureAssignments,
}

impl Related<super::car_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::car_feature::Entity> for Entity {
    fn to() -> RelationDef {
        super::car_feature_assignment::Relation::CarFeature.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::car_feature_assignment::Relation::Car.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
