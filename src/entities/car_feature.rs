use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(25))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarFeatureKind {
    #[sea_orm(string_value = "AIR_BAGS")]
    AirBags,
    #[sea_orm(string_value = "AIR_CONDITIONING")]
    AirConditioning,
    #[sea_orm(string_value = "ABS")]
    Abs,
    #[sea_orm(string_value = "ASSISTED_STEERING")]
    AssistedSteering,
    #[sea_orm(string_value = "BLUETOOTH")]
    Bluetooth,
    #[sea_orm(string_value = "DASH_CAM")]
    DashCam,
    #[sea_orm(string_value = "DRIVE_MODES")]
    DriveModes,
    #[sea_orm(string_value = "ESC")]
    Esc,
    #[sea_orm(string_value = "GPS_NAVIGATION")]
    GpsNavigation,
    #[sea_orm(string_value = "KEYLESS_ENTRY")]
    KeylessEntry,
    #[sea_orm(string_value = "LED_HEADLIGHTS")]
    LedHeadlights,
    #[sea_orm(string_value = "POP_UP_HEADLIGHTS")]
    PopUpHeadlights,
    #[sea_orm(string_value = "POWERED_WINDOWS")]
    PoweredWindows,
    #[sea_orm(string_value = "REAR_CAMERA")]
    RearCamera,
    #[sea_orm(string_value = "USB_PORTS")]
    UsbPorts,
}

impl CarFeatureKind {
    pub fn names() -> Vec<String> {
        Self::iter().map(|kind| kind.to_value()).collect()
    }

    /// Looks up a feature by its stored name, e.g. `"DASH_CAM"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::iter().find(|kind| kind.to_value() == name)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "car_feature")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: CarFeatureKind,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::car_feature_assignment::Entity")]
    Assignments,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        super::car_feature_assignment::Relation::Car.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::car_feature_assignment::Relation::CarFeature.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
