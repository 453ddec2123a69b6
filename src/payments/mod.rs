pub mod stripe_gateway;

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use self::stripe_gateway::StripeGateway;

/// Metadata key correlating a payment intent with its booking.
pub const BOOKING_ID_METADATA_KEY: &str = "bookingId";

const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Customer fields mirrored onto the provider-side account.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAccountProfile {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub address_city: String,
    pub address_postal_code: String,
    pub address_state: Option<String>,
    pub address_country: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub account_id: String,
    pub booking_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntentHandle {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
}

/// A verified webhook notification.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    Succeeded { booking_id: Uuid },
    Canceled { booking_id: Uuid },
    Other { event_type: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates the provider-side account and returns its id.
    async fn create_customer(&self, profile: &PaymentAccountProfile) -> AppResult<String>;

    async fn update_customer(
        &self,
        account_id: &str,
        profile: &PaymentAccountProfile,
    ) -> AppResult<()>;

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> AppResult<PaymentIntentHandle>;

    /// Verifies `signature` against the webhook secret before decoding `payload`.
    fn parse_event(&self, payload: &str, signature: &str) -> AppResult<PaymentEvent>;
}

/// Runs `op` under `timeout`, retrying up to `max_attempts` times with a linear backoff.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, timeout: Duration, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match tokio::time::timeout(timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => {
                tracing::warn!(attempt, error = %err, "Payment provider call failed");
                last_error = Some(err);
            }
            Err(_) => {
                tracing::warn!(attempt, "Payment provider call timed out");
                last_error = Some(AppError::Upstream(
                    "Payment provider timed out".to_string(),
                ));
            }
        }

        if attempt < attempts {
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
        }
    }

    Err(last_error
        .unwrap_or_else(|| AppError::Upstream("Payment provider call failed".to_string())))
}

pub fn booking_id_from_metadata(metadata: &HashMap<String, String>) -> AppResult<Uuid> {
    let raw = metadata.get(BOOKING_ID_METADATA_KEY).ok_or_else(|| {
        AppError::BadRequest(format!("Missing {} in payment metadata", BOOKING_ID_METADATA_KEY))
    })?;

    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid booking id in payment metadata: {}", raw)))
}
