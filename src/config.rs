use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub stripe_secret_key: String,
    pub webhook_secret: String,
    /// Lower-case ISO code, e.g. `thb`.
    pub currency: String,
    pub timeout: Duration,
    /// Attempts for the payment-account update call, at least one.
    pub max_attempts: u32,
}

#[derive(Clone)]
pub struct EmailConfig {
    /// Empty disables sending.
    pub resend_api_key: String,
    pub from: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub payment: PaymentConfig,
    pub email: EmailConfig,
    /// Offset of the local business day, used by the same-day booking rule.
    pub business_offset: FixedOffset,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let offset_hours: i32 = parsed("BUSINESS_UTC_OFFSET_HOURS", 7)?;
        let business_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or(ConfigError::Invalid("BUSINESS_UTC_OFFSET_HOURS"))?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: parsed("JWT_EXPIRATION_HOURS", 24)?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: parsed("SERVER_PORT", 3000)?,
            payment: PaymentConfig {
                stripe_secret_key: required("STRIPE_SECRET_KEY")?,
                webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
                currency: optional("PAYMENT_CURRENCY", "thb").to_lowercase(),
                timeout: Duration::from_secs(parsed("PAYMENT_TIMEOUT_SECS", 10)?),
                max_attempts: parsed::<u32>("PAYMENT_MAX_ATTEMPTS", 2)?.max(1),
            },
            email: EmailConfig {
                resend_api_key: optional("RESEND_API_KEY", ""),
                from: optional("EMAIL_FROM", "Furai <bookings@furai.rent>"),
                timeout: Duration::from_secs(parsed("EMAIL_TIMEOUT_SECS", 10)?),
            },
            business_offset,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}
