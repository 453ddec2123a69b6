use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::{car_feature, car_media};
use crate::error::AppResult;
use crate::services::cars::{self, CarDetails};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub car: Option<Uuid>,
}

/// List the fleet
pub async fn list_cars(State(state): State<AppState>) -> AppResult<Json<Vec<CarDetails>>> {
    Ok(Json(cars::list_cars(&state.db).await?))
}

pub async fn get_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
) -> AppResult<Json<CarDetails>> {
    Ok(Json(cars::get_car(&state.db, car_id).await?))
}

pub async fn get_car_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<CarDetails>> {
    Ok(Json(cars::get_car_by_slug(&state.db, &slug).await?))
}

/// List media, optionally for one car (`?car=<id>`)
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> AppResult<Json<Vec<car_media::Model>>> {
    Ok(Json(cars::list_media(&state.db, query.car).await?))
}

pub async fn list_features(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<car_feature::Model>>> {
    Ok(Json(cars::list_features(&state.db).await?))
}
