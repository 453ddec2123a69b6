#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, TimeZone, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use uuid::Uuid;

use car_rental_backend::config::{Config, EmailConfig, PaymentConfig};
use car_rental_backend::entities::car::{CarMake, Drivetrain, FuelType, Transmission};
use car_rental_backend::entities::{
    booking, car, car_feature, car_feature_assignment, car_media, customer, user,
};
use car_rental_backend::error::{AppError, AppResult};
use car_rental_backend::notifications::{EmailMessage, EmailSender, Notifier};
use car_rental_backend::payments::{
    PaymentAccountProfile, PaymentEvent, PaymentGateway, PaymentIntentHandle, PaymentIntentRequest,
};
use car_rental_backend::services::bookings::CreateBookingCommand;
use car_rental_backend::services::cars::{self, CarDetails, CarPrices, CreateCarCommand};
use car_rental_backend::services::customers::CustomerProfile;
use car_rental_backend::AppState;

pub const JWT_SECRET: &str = "test-secret";
pub const VALID_SIGNATURE: &str = "valid";

/// Payment provider double. Records every call and can be told to fail.
#[derive(Default)]
pub struct FakePayments {
    pub created: Mutex<Vec<PaymentAccountProfile>>,
    pub updated: Mutex<Vec<(String, PaymentAccountProfile)>>,
    pub intents: Mutex<Vec<PaymentIntentRequest>>,
    /// Number of upcoming `update_customer` calls that fail.
    pub failing_updates: AtomicU32,
    pub fail_creates: AtomicBool,
    next_id: AtomicUsize,
}

impl FakePayments {
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn updated_count(&self) -> usize {
        self.updated.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_customer(&self, profile: &PaymentAccountProfile) -> AppResult<String> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("create failed".to_string()));
        }
        self.created.lock().unwrap().push(profile.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("cus_test_{}", n))
    }

    async fn update_customer(
        &self,
        account_id: &str,
        profile: &PaymentAccountProfile,
    ) -> AppResult<()> {
        let remaining = self.failing_updates.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_updates.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Upstream("update failed".to_string()));
        }
        self.updated
            .lock()
            .unwrap()
            .push((account_id.to_string(), profile.clone()));
        Ok(())
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> AppResult<PaymentIntentHandle> {
        self.intents.lock().unwrap().push(request.clone());
        Ok(PaymentIntentHandle {
            payment_intent_id: format!("pi_{}", request.booking_id.simple()),
            client_secret: Some("pi_secret".to_string()),
        })
    }

    /// Accepts `{"type": ..., "bookingId": ...}` signed with [`VALID_SIGNATURE`].
    fn parse_event(&self, payload: &str, signature: &str) -> AppResult<PaymentEvent> {
        if signature != VALID_SIGNATURE {
            return Err(AppError::BadRequest("Webhook Error: bad signature".to_string()));
        }
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| AppError::BadRequest(format!("Webhook Error: {}", e)))?;

        let event_type = value["type"].as_str().unwrap_or_default().to_string();
        let booking_id = || -> AppResult<Uuid> {
            value["bookingId"]
                .as_str()
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| AppError::BadRequest("Missing bookingId".to_string()))
        };

        match event_type.as_str() {
            "payment_intent.succeeded" => Ok(PaymentEvent::Succeeded {
                booking_id: booking_id()?,
            }),
            "payment_intent.canceled" => Ok(PaymentEvent::Canceled {
                booking_id: booking_id()?,
            }),
            _ => Ok(PaymentEvent::Other { event_type }),
        }
    }
}

/// Email double that keeps every message.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn templates(&self) -> Vec<&'static str> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|message| message.template.name())
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mailbox on fire".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        payment: PaymentConfig {
            stripe_secret_key: "sk_test".to_string(),
            webhook_secret: "whsec_test".to_string(),
            currency: "thb".to_string(),
            timeout: Duration::from_secs(1),
            max_attempts: 2,
        },
        email: EmailConfig {
            resend_api_key: String::new(),
            from: "Furai <bookings@furai.rent>".to_string(),
            timeout: Duration::from_secs(1),
        },
        business_offset: FixedOffset::east_opt(7 * 3600).unwrap(),
        admin_email: None,
        admin_password: None,
    }
}

pub struct TestContext {
    pub state: AppState,
    pub payments: Arc<FakePayments>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    /// Fresh in-memory SQLite database with every table created.
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        create_tables(&db).await;

        let payments = Arc::new(FakePayments::default());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState {
            db,
            config: test_config(),
            payments: payments.clone(),
            notifier: Notifier::new(mailer.clone()),
        };

        Self {
            state,
            payments,
            mailer,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }
}

async fn create_tables(db: &DatabaseConnection) {
    let schema = Schema::new(sea_orm::DbBackend::Sqlite);
    let backend = db.get_database_backend();

    let statements = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(customer::Entity),
        schema.create_table_from_entity(car::Entity),
        schema.create_table_from_entity(car_feature::Entity),
        schema.create_table_from_entity(car_feature_assignment::Entity),
        schema.create_table_from_entity(car_media::Entity),
        schema.create_table_from_entity(booking::Entity),
    ];

    for statement in statements {
        db.execute(backend.build(&statement)).await.unwrap();
    }
}

/// Whole hours after 10:00 Bangkok time, three days from now.
pub fn slot(hours: i64) -> DateTime<Utc> {
    let day = (Utc::now() + ChronoDuration::days(3)).date_naive();
    let base = Utc
        .from_utc_datetime(&day.and_hms_opt(3, 0, 0).unwrap());
    base + ChronoDuration::hours(hours)
}

pub fn car_command(model: &str, hourly_cents: i32) -> CreateCarCommand {
    CreateCarCommand {
        make: CarMake::Honda,
        model: model.to_string(),
        slug: None,
        capacity: 5,
        transmission: Transmission::Automatic,
        drivetrain: Drivetrain::FrontWheel,
        fuel_type: FuelType::Gasohol95,
        fuel_consumption_metric: 6.5,
        engine_code: "L15B".to_string(),
        power_hp: 180,
        power_max_rpm: 6000,
        prices: CarPrices {
            price_hourly_cents: hourly_cents,
            price_three_hours_cents: hourly_cents * 3,
            price_six_hours_cents: hourly_cents * 5,
            price_nine_hours_cents: hourly_cents * 7,
            price_twelve_hours_cents: hourly_cents * 9,
            price_twenty_four_hours_cents: hourly_cents * 15,
        },
        feature_ids: Vec::new(),
    }
}

pub async fn create_car(ctx: &TestContext, model: &str) -> CarDetails {
    cars::create_car(ctx.db(), car_command(model, 500)).await.unwrap()
}

pub fn profile(country: &str, passport: Option<&str>) -> CustomerProfile {
    CustomerProfile {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        address_line1: "1 Sukhumvit Rd".to_string(),
        address_line2: None,
        address_city: "Bangkok".to_string(),
        address_postal_code: "10110".to_string(),
        address_state: None,
        address_country: country.to_string(),
        phone: "+66 2 000 0000".to_string(),
        passport: passport.map(str::to_string),
    }
}

pub fn booking_command(
    car_id: Uuid,
    email: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> CreateBookingCommand {
    CreateBookingCommand {
        car_id,
        email: email.to_string(),
        start_date: start,
        end_date: end,
        price_cents: 3000,
        customer: profile("FR", Some("12AB34567")),
    }
}
