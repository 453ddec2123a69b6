use std::collections::HashMap;

use async_trait::async_trait;
use stripe::{
    Address, Client, CreateCustomer, CreatePaymentIntent, Currency, Customer, CustomerId, Event,
    EventObject, EventType, PaymentIntent, StripeError, UpdateCustomer, Webhook,
};

use super::{
    booking_id_from_metadata, PaymentAccountProfile, PaymentEvent, PaymentGateway,
    PaymentIntentHandle, PaymentIntentRequest, BOOKING_ID_METADATA_KEY,
};
use crate::config::PaymentConfig;
use crate::error::{AppError, AppResult};

/// Stripe-backed payment gateway.
pub struct StripeGateway {
    client: Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: Client::new(config.stripe_secret_key.clone()),
            webhook_secret: config.webhook_secret.clone(),
        }
    }
}

fn upstream(err: StripeError) -> AppError {
    AppError::Upstream(format!("Stripe error: {}", err))
}

fn parse_customer_id(account_id: &str) -> AppResult<CustomerId> {
    account_id.parse::<CustomerId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse customer id: {}. {}",
            account_id, e
        ))
    })
}

fn parse_currency(code: &str) -> AppResult<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_lowercase()))
        .map_err(|_| AppError::Internal(format!("Unsupported currency: {}", code)))
}

fn address(profile: &PaymentAccountProfile) -> Address {
    Address {
        city: Some(profile.address_city.clone()),
        country: Some(profile.address_country.clone()),
        line1: Some(profile.address_line1.clone()),
        line2: profile.address_line2.clone(),
        postal_code: Some(profile.address_postal_code.clone()),
        state: profile.address_state.clone(),
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_customer(&self, profile: &PaymentAccountProfile) -> AppResult<String> {
        let params = CreateCustomer {
            email: Some(&profile.email),
            name: Some(&profile.name),
            phone: Some(&profile.phone),
            address: Some(address(profile)),
            ..Default::default()
        };

        let customer = Customer::create(&self.client, params)
            .await
            .map_err(upstream)?;

        Ok(customer.id.to_string())
    }

    async fn update_customer(
        &self,
        account_id: &str,
        profile: &PaymentAccountProfile,
    ) -> AppResult<()> {
        let id = parse_customer_id(account_id)?;
        let params = UpdateCustomer {
            email: Some(&profile.email),
            name: Some(&profile.name),
            phone: Some(&profile.phone),
            address: Some(address(profile)),
            ..Default::default()
        };

        Customer::update(&self.client, &id, params)
            .await
            .map_err(upstream)?;

        Ok(())
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> AppResult<PaymentIntentHandle> {
        let mut params =
            CreatePaymentIntent::new(request.amount_cents, parse_currency(&request.currency)?);
        params.customer = Some(parse_customer_id(&request.account_id)?);
        params.metadata = Some(HashMap::from([(
            BOOKING_ID_METADATA_KEY.to_string(),
            request.booking_id.to_string(),
        )]));

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(upstream)?;

        Ok(PaymentIntentHandle {
            payment_intent_id: intent.id.to_string(),
            client_secret: intent.client_secret,
        })
    }

    fn parse_event(&self, payload: &str, signature: &str) -> AppResult<PaymentEvent> {
        let event = Webhook::construct_event(payload, signature, &self.webhook_secret)
            .map_err(|e| AppError::BadRequest(format!("Webhook Error: {}", e)))?;

        payment_event(event)
    }
}

fn payment_event(event: Event) -> AppResult<PaymentEvent> {
    match event.type_ {
        EventType::PaymentIntentSucceeded => match event.data.object {
            EventObject::PaymentIntent(intent) => Ok(PaymentEvent::Succeeded {
                booking_id: booking_id_from_metadata(&intent.metadata)?,
            }),
            _ => Err(AppError::BadRequest(
                "Webhook payload is not a payment intent".to_string(),
            )),
        },
        EventType::PaymentIntentCanceled => match event.data.object {
            EventObject::PaymentIntent(intent) => Ok(PaymentEvent::Canceled {
                booking_id: booking_id_from_metadata(&intent.metadata)?,
            }),
            _ => Err(AppError::BadRequest(
                "Webhook payload is not a payment intent".to_string(),
            )),
        },
        other => Ok(PaymentEvent::Other {
            event_type: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use hmac::{Hmac, Mac};
    use serde_json::{json, Value};
    use sha2::Sha256;
    use uuid::Uuid;

    use super::*;

    const SECRET: &str = "whsec_test";

    fn gateway() -> StripeGateway {
        StripeGateway::new(&PaymentConfig {
            stripe_secret_key: "sk_test_123".to_string(),
            webhook_secret: SECRET.to_string(),
            currency: "thb".to_string(),
            timeout: Duration::from_secs(1),
            max_attempts: 1,
        })
    }

    fn sign(payload: &str, secret: &str) -> String {
        let timestamp = Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    fn intent(booking_id: Uuid, status: &str) -> Value {
        json!({
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 3000,
            "amount_capturable": 0,
            "amount_received": 3000,
            "capture_method": "automatic",
            "confirmation_method": "automatic",
            "created": 1767225600,
            "currency": "thb",
            "livemode": false,
            "metadata": { (BOOKING_ID_METADATA_KEY): booking_id.to_string() },
            "payment_method_types": ["card"],
            "status": status
        })
    }

    fn event(event_type: &str, object: Value) -> String {
        json!({
            "id": "evt_123",
            "object": "event",
            "api_version": "2023-10-16",
            "created": 1767225600,
            "data": { "object": object },
            "livemode": false,
            "pending_webhooks": 1,
            "request": null,
            "type": event_type
        })
        .to_string()
    }

    #[test]
    fn test_address_mirrors_profile() {
        let profile = PaymentAccountProfile {
            email: "jane@example.com".to_string(),
            name: "Jane Doe".to_string(),
            phone: "+66 2 123 4567".to_string(),
            address_line1: "1 Sukhumvit Rd".to_string(),
            address_line2: None,
            address_city: "Bangkok".to_string(),
            address_postal_code: "10110".to_string(),
            address_state: Some("Bangkok".to_string()),
            address_country: "TH".to_string(),
        };

        let address = address(&profile);
        assert_eq!(address.line1.as_deref(), Some("1 Sukhumvit Rd"));
        assert_eq!(address.line2, None);
        assert_eq!(address.postal_code.as_deref(), Some("10110"));
        assert_eq!(address.country.as_deref(), Some("TH"));
    }

    #[test]
    fn test_signed_succeeded_event_names_booking() {
        let booking_id = Uuid::new_v4();
        let payload = event("payment_intent.succeeded", intent(booking_id, "succeeded"));

        let parsed = gateway().parse_event(&payload, &sign(&payload, SECRET)).unwrap();
        assert_eq!(parsed, PaymentEvent::Succeeded { booking_id });
    }

    #[test]
    fn test_signed_canceled_event_names_booking() {
        let booking_id = Uuid::new_v4();
        let payload = event("payment_intent.canceled", intent(booking_id, "canceled"));

        let parsed = gateway().parse_event(&payload, &sign(&payload, SECRET)).unwrap();
        assert_eq!(parsed, PaymentEvent::Canceled { booking_id });
    }

    #[test]
    fn test_wrong_signature_is_rejected() {
        let payload = event("payment_intent.succeeded", intent(Uuid::new_v4(), "succeeded"));

        let err = gateway()
            .parse_event(&payload, &sign(&payload, "whsec_other"))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let signature = sign(&payload, SECRET);
        let tampered = payload.replace("3000", "1");
        let err = gateway().parse_event(&tampered, &signature).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_payment_event_without_intent_is_rejected() {
        let customer = json!({ "id": "cus_123", "object": "customer", "livemode": false });
        let payload = event("payment_intent.succeeded", customer);

        let err = gateway().parse_event(&payload, &sign(&payload, SECRET)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_unrelated_event_is_passed_through() {
        let customer = json!({ "id": "cus_123", "object": "customer", "livemode": false });
        let payload = event("customer.created", customer);

        let parsed = gateway().parse_event(&payload, &sign(&payload, SECRET)).unwrap();
        assert_eq!(
            parsed,
            PaymentEvent::Other {
                event_type: "customer.created".to_string()
            }
        );
    }
}
