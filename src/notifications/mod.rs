pub mod resend;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::booking::BookingStatus;
use crate::error::AppResult;

pub use self::resend::ResendSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailTemplate {
    BookingCreated,
    BookingConfirmed,
    BookingCanceled,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::BookingCreated => "booking-created",
            EmailTemplate::BookingConfirmed => "booking-confirmed",
            EmailTemplate::BookingCanceled => "booking-canceled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub template: EmailTemplate,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Data rendered into booking emails.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingEmail {
    pub customer_email: String,
    pub customer_name: String,
    pub car_name: String,
    pub car_thumbnail: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub price_cents: i64,
    pub currency: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Best-effort dispatcher: delivery failures are logged, never returned.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
}

impl Notifier {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    pub async fn dispatch(&self, template: EmailTemplate, data: &BookingEmail) {
        let message = render(template, data);
        match self.sender.send(&message).await {
            Ok(()) => tracing::debug!(template = template.name(), to = %message.to, "Email sent"),
            Err(err) => tracing::warn!(
                template = template.name(),
                to = %message.to,
                error = %err,
                "Failed to send email"
            ),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_price(cents: i64, currency: &str) -> String {
    format!("{}.{:02} {}", cents / 100, cents % 100, currency.to_uppercase())
}

pub fn render(template: EmailTemplate, data: &BookingEmail) -> EmailMessage {
    let (subject, headline) = match template {
        EmailTemplate::BookingCreated => (
            format!("Your {} booking request", data.car_name),
            "We received your booking. It will be confirmed once the payment succeeds.",
        ),
        EmailTemplate::BookingConfirmed => (
            format!("Your {} booking is confirmed", data.car_name),
            "Your payment went through and your car is reserved.",
        ),
        EmailTemplate::BookingCanceled => (
            format!("Your {} booking was canceled", data.car_name),
            "Your booking has been canceled.",
        ),
    };

    let car = escape_html(&data.car_name);
    let thumbnail = data
        .car_thumbnail
        .as_ref()
        .map(|url| format!(r#"<img src="{}" alt="{}" width="480"/>"#, escape_html(url), car))
        .unwrap_or_default();

    let html = format!(
        "<p>Hello {name},</p><p>{headline}</p>{thumbnail}\
         <ul><li>Car: {car}</li><li>From: {start}</li><li>To: {end}</li>\
         <li>Price: {price}</li><li>Status: {status:?}</li></ul>",
        name = escape_html(&data.customer_name),
        headline = headline,
        thumbnail = thumbnail,
        car = car,
        start = data.start_date.format("%Y-%m-%d %H:%M UTC"),
        end = data.end_date.format("%Y-%m-%d %H:%M UTC"),
        price = format_price(data.price_cents, &data.currency),
        status = data.status,
    );

    EmailMessage {
        template,
        to: data.customer_email.clone(),
        subject,
        html,
    }
}
