use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "car_feature_assignment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub car_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub car_feature_id: Uuid,
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
        belongs_to = "super::car_feature::Entity",
        from = "Column::CarFeatureId",
        to = "super::car_feature::Column::Id",
        on_delete = "Cascade"
    )]
    CarFeature,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl Related<super::car_feature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CarFeature.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
