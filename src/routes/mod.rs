use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, bookings, cars, customers, webhooks};
use crate::middleware::auth::{auth_middleware, require_staff};
use crate::middleware::rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new().route("/login", post(auth::login));

    // Public catalogue
    let public_routes = Router::new()
        .route("/cars", get(cars::list_cars))
        .route("/cars/{id}", get(cars::get_car))
        .route("/cars/slug/{slug}", get(cars::get_car_by_slug))
        .route("/car-medias", get(cars::list_media))
        .route("/car-features", get(cars::list_features));

    // Admin console (requires auth + staff)
    let admin_routes = Router::new()
        // Inventory
        .route("/cars", post(admin::create_car))
        .route("/cars/{id}", put(admin::update_car).delete(admin::delete_car))
        .route("/cars/{id}/features", put(admin::set_car_features))
        .route("/car-features", post(admin::create_feature))
        .route("/car-features/{id}", delete(admin::delete_feature))
        .route("/car-medias", post(admin::create_media))
        .route("/car-medias/{id}", delete(admin::delete_media))
        // Users
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/users/{id}/token", post(admin::issue_token))
        // Bookings
        .route("/bookings/{id}", delete(admin::delete_booking))
        .route("/bookings/{id}/complete", post(admin::complete_booking))
        .layer(middleware::from_fn(require_staff))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Anyone may book; everything else about a booking needs a token
    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_bookings)
                .layer(create_user_governor())
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .post(bookings::create_booking),
        )
        .merge(
            Router::new()
                .route("/{id}", get(bookings::get_booking))
                .route("/{id}/cancel", post(bookings::cancel_booking))
                .route(
                    "/{id}/create_payment_intent",
                    post(bookings::create_payment_intent),
                )
                .layer(create_user_governor())
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let customer_routes = Router::new()
        .route("/me", get(customers::me))
        .route(
            "/{id}",
            get(customers::get_customer).patch(customers::update_customer),
        )
        .layer(create_user_governor())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let webhook_routes = Router::new().route("/stripe", post(webhooks::stripe_webhook));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/webhooks", webhook_routes)
        .with_state(state)
}
