use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use car_rental_backend::{
    config::Config,
    db,
    middleware::rate_limit::{create_global_governor, log_request},
    notifications::{Notifier, ResendSender},
    payments::StripeGateway,
    routes,
    services::users,
    AppResult, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "car_rental_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting server at {}", config.server_addr());

    let db = db::connect(&config).await?;
    tracing::info!("Connected to database");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations complete");

    seed_admin(&db, &config).await?;

    let notifier = Notifier::new(Arc::new(ResendSender::new(&config.email)?));
    let state = AppState {
        db,
        config: config.clone(),
        payments: Arc::new(StripeGateway::new(&config.payment)),
        notifier,
    };

    let app = routes::create_router(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor());

    // Peer addresses feed the IP rate limiter
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Seed the configured superuser if it doesn't exist
async fn seed_admin(db: &DatabaseConnection, config: &Config) -> AppResult<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("No admin credentials configured, skipping seed");
        return Ok(());
    };

    if users::find_by_email(db, email).await?.is_some() {
        return Ok(());
    }

    let admin = users::create_superuser(db, email, password).await?;
    tracing::info!(user_id = %admin.id, "Admin account created: {}", admin.email);
    Ok(())
}
