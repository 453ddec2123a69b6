mod common;

use sea_orm::{EntityTrait, PaginatorTrait};

use car_rental_backend::entities::car_feature::CarFeatureKind;
use car_rental_backend::entities::{booking, car_media};
use car_rental_backend::error::{AppError, ValidationError};
use car_rental_backend::services::bookings::create_booking;
use car_rental_backend::services::cars::{
    self, CarPrices, CreateMediaCommand, UpdateCarCommand,
};

use common::{booking_command, car_command, create_car, slot, TestContext};

fn media(car_id: uuid::Uuid, url: &str, is_thumbnail: bool) -> CreateMediaCommand {
    CreateMediaCommand {
        car_id,
        url: url.to_string(),
        is_thumbnail,
    }
}

#[tokio::test]
async fn test_slug_defaults_to_make_and_model() {
    let ctx = TestContext::new().await;

    let car = create_car(&ctx, "Civic Type R").await;
    assert_eq!(car.car.slug, "honda-civic-type-r");
    assert_eq!(car.name, "Honda Civic Type R");

    let found = cars::get_car_by_slug(ctx.db(), "honda-civic-type-r")
        .await
        .unwrap();
    assert_eq!(found.car.id, car.car.id);
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let ctx = TestContext::new().await;
    create_car(&ctx, "Civic").await;

    let err = cars::create_car(ctx.db(), car_command("Civic", 500))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_negative_prices_rejected() {
    let ctx = TestContext::new().await;

    let err = cars::create_car(ctx.db(), car_command("Civic", -100))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_features_closed_set_and_unique() {
    let ctx = TestContext::new().await;

    let err = cars::create_feature(ctx.db(), "JET_ENGINE").await.unwrap_err();
    assert_eq!(err.validation(), Some(ValidationError::InvalidFeature));

    let dash_cam = cars::create_feature(ctx.db(), "DASH_CAM").await.unwrap();
    assert_eq!(dash_cam.name, CarFeatureKind::DashCam);

    let err = cars::create_feature(ctx.db(), "DASH_CAM").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_set_car_features_replaces_set() {
    let ctx = TestContext::new().await;
    let car = create_car(&ctx, "Civic").await;
    let abs = cars::create_feature(ctx.db(), "ABS").await.unwrap();
    let usb = cars::create_feature(ctx.db(), "USB_PORTS").await.unwrap();
    let gps = cars::create_feature(ctx.db(), "GPS_NAVIGATION").await.unwrap();

    let details = cars::set_car_features(ctx.db(), car.car.id, &[abs.id, usb.id])
        .await
        .unwrap();
    assert_eq!(
        details.features,
        vec![CarFeatureKind::Abs, CarFeatureKind::UsbPorts]
    );

    let details = cars::set_car_features(ctx.db(), car.car.id, &[gps.id])
        .await
        .unwrap();
    assert_eq!(details.features, vec![CarFeatureKind::GpsNavigation]);

    let err = cars::set_car_features(ctx.db(), car.car.id, &[uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_second_thumbnail_rejected_without_demoting_first() {
    let ctx = TestContext::new().await;
    let car = create_car(&ctx, "Civic").await;

    let first = cars::create_media(
        ctx.db(),
        media(car.car.id, "https://cdn.furai.rent/civic.jpg", true),
    )
    .await
    .unwrap();

    let err = cars::create_media(
        ctx.db(),
        media(car.car.id, "https://cdn.furai.rent/civic-2.jpg", true),
    )
    .await
    .unwrap_err();
    assert_eq!(err.validation(), Some(ValidationError::MultipleThumbnails));

    cars::create_media(
        ctx.db(),
        media(car.car.id, "https://cdn.furai.rent/civic-interior.jpg", false),
    )
    .await
    .unwrap();

    let stored = car_media::Entity::find_by_id(first.id)
        .one(ctx.db())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_thumbnail);

    let details = cars::get_car(ctx.db(), car.car.id).await.unwrap();
    assert_eq!(
        details.thumbnail_url.as_deref(),
        Some("https://cdn.furai.rent/civic.jpg")
    );
    assert_eq!(
        cars::list_media(ctx.db(), Some(car.car.id)).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_media_requires_http_url() {
    let ctx = TestContext::new().await;
    let car = create_car(&ctx, "Civic").await;

    let err = cars::create_media(ctx.db(), media(car.car.id, "not a url", false))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_list_cars_cheapest_first() {
    let ctx = TestContext::new().await;
    cars::create_car(ctx.db(), car_command("Civic", 900)).await.unwrap();
    cars::create_car(ctx.db(), car_command("Jazz", 300)).await.unwrap();

    let listed = cars::list_cars(ctx.db()).await.unwrap();
    let slugs: Vec<&str> = listed.iter().map(|c| c.car.slug.as_str()).collect();
    assert_eq!(slugs, vec!["honda-jazz", "honda-civic"]);
}

#[tokio::test]
async fn test_update_car_keeps_unset_fields() {
    let ctx = TestContext::new().await;
    let car = create_car(&ctx, "Civic").await;

    let updated = cars::update_car(
        ctx.db(),
        car.car.id,
        UpdateCarCommand {
            capacity: Some(4),
            prices: Some(CarPrices {
                price_hourly_cents: 600,
                price_three_hours_cents: 1500,
                price_six_hours_cents: 2500,
                price_nine_hours_cents: 3500,
                price_twelve_hours_cents: 4500,
                price_twenty_four_hours_cents: 7000,
            }),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.car.capacity, 4);
    assert_eq!(updated.car.price_hourly_cents, 600);
    assert_eq!(updated.car.model, "Civic");
    assert_eq!(updated.car.slug, "honda-civic");
}

#[tokio::test]
async fn test_delete_car_cascades_to_bookings() {
    let ctx = TestContext::new().await;
    let car = create_car(&ctx, "Civic").await;
    create_booking(
        &ctx.state,
        booking_command(car.car.id, "jane@example.com", slot(0), slot(6)),
    )
    .await
    .unwrap();

    cars::delete_car(ctx.db(), car.car.id).await.unwrap();

    assert_eq!(booking::Entity::find().count(ctx.db()).await.unwrap(), 0);
    let err = cars::get_car(ctx.db(), car.car.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
