use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::entities::{customer, user};
use crate::error::{AppError, AppResult, ValidationError};
use crate::payments::{with_retry, PaymentAccountProfile, PaymentGateway};
use crate::services::users;
use crate::AppState;

pub const THAILAND_COUNTRY_CODE: &str = "TH";

/// Legal and contact fields of a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub address_city: String,
    pub address_postal_code: String,
    #[serde(default)]
    pub address_state: Option<String>,
    pub address_country: String,
    pub phone: String,
    #[serde(default)]
    pub passport: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CustomerProfile {
    pub fn from_model(model: &customer::Model) -> Self {
        Self {
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            address_line1: model.address_line1.clone(),
            address_line2: model.address_line2.clone(),
            address_city: model.address_city.clone(),
            address_postal_code: model.address_postal_code.clone(),
            address_state: model.address_state.clone(),
            address_country: model.address_country.clone(),
            phone: model.phone.clone(),
            passport: model.passport.clone(),
        }
    }

    /// Upper-cases the country code and turns blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        Self {
            address_country: self.address_country.trim().to_uppercase(),
            address_line2: non_blank(self.address_line2),
            address_state: non_blank(self.address_state),
            passport: non_blank(self.passport),
            ..self
        }
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn account_profile(&self, email: &str) -> PaymentAccountProfile {
        PaymentAccountProfile {
            email: email.to_string(),
            name: self.name(),
            phone: self.phone.clone(),
            address_line1: self.address_line1.clone(),
            address_line2: self.address_line2.clone(),
            address_city: self.address_city.clone(),
            address_postal_code: self.address_postal_code.clone(),
            address_state: self.address_state.clone(),
            address_country: self.address_country.clone(),
        }
    }
}

/// Foreign nationals must supply a passport number.
pub fn validate_passport(profile: &CustomerProfile) -> Result<(), ValidationError> {
    let has_passport = profile
        .passport
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());

    if !profile.address_country.trim().eq_ignore_ascii_case(THAILAND_COUNTRY_CODE) && !has_passport {
        return Err(ValidationError::PassportRequired);
    }
    Ok(())
}

/// Partial profile update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_city: Option<String>,
    pub address_postal_code: Option<String>,
    pub address_state: Option<String>,
    pub address_country: Option<String>,
    pub phone: Option<String>,
    pub passport: Option<String>,
}

impl CustomerPatch {
    pub fn apply(self, profile: CustomerProfile) -> CustomerProfile {
        CustomerProfile {
            first_name: self.first_name.unwrap_or(profile.first_name),
            last_name: self.last_name.unwrap_or(profile.last_name),
            address_line1: self.address_line1.unwrap_or(profile.address_line1),
            address_line2: self.address_line2.or(profile.address_line2),
            address_city: self.address_city.unwrap_or(profile.address_city),
            address_postal_code: self.address_postal_code.unwrap_or(profile.address_postal_code),
            address_state: self.address_state.or(profile.address_state),
            address_country: self.address_country.unwrap_or(profile.address_country),
            phone: self.phone.unwrap_or(profile.phone),
            passport: self.passport.or(profile.passport),
        }
    }
}

/// Customer profiles and their payment-provider accounts.
///
/// The provider call always happens before the local write, so a provider
/// failure leaves the local row untouched.
pub struct CustomerDirectory<'a> {
    payments: &'a dyn PaymentGateway,
    config: &'a PaymentConfig,
}

impl<'a> CustomerDirectory<'a> {
    pub fn new(payments: &'a dyn PaymentGateway, config: &'a PaymentConfig) -> Self {
        Self { payments, config }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.payments.as_ref(), &state.config.payment)
    }

    /// Resolves the user for `email` and creates or updates its customer.
    pub async fn find_or_create<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
        profile: &CustomerProfile,
    ) -> AppResult<customer::Model> {
        let user = users::get_or_create_by_email(db, email).await?;

        match find_by_user(db, user.id).await? {
            Some(existing) => self.update(db, existing, &user.email, profile).await,
            None => self.create(db, &user, profile).await,
        }
    }

    pub async fn create<C: ConnectionTrait>(
        &self,
        db: &C,
        user: &user::Model,
        profile: &CustomerProfile,
    ) -> AppResult<customer::Model> {
        let profile = profile.clone().normalized();
        validate_passport(&profile)?;

        let account = profile.account_profile(&user.email);
        let stripe_id = with_retry(1, self.config.timeout, || {
            self.payments.create_customer(&account)
        })
        .await?;

        let now = Utc::now();
        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            stripe_id: Set(stripe_id),
            first_name: Set(profile.first_name),
            last_name: Set(profile.last_name),
            address_line1: Set(profile.address_line1),
            address_line2: Set(profile.address_line2),
            address_city: Set(profile.address_city),
            address_postal_code: Set(profile.address_postal_code),
            address_state: Set(profile.address_state),
            address_country: Set(profile.address_country),
            phone: Set(profile.phone),
            passport: Set(profile.passport),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;

        tracing::info!(customer_id = %customer.id, user_id = %user.id, "Customer created");
        Ok(customer)
    }

    /// Pushes the profile to the existing payment account, then to the local row.
    pub async fn update<C: ConnectionTrait>(
        &self,
        db: &C,
        existing: customer::Model,
        email: &str,
        profile: &CustomerProfile,
    ) -> AppResult<customer::Model> {
        let profile = profile.clone().normalized();
        validate_passport(&profile)?;

        let account = profile.account_profile(email);
        let account_id = existing.stripe_id.clone();
        with_retry(self.config.max_attempts, self.config.timeout, || {
            self.payments.update_customer(&account_id, &account)
        })
        .await?;

        let mut active: customer::ActiveModel = existing.into();
        active.first_name = Set(profile.first_name);
        active.last_name = Set(profile.last_name);
        active.address_line1 = Set(profile.address_line1);
        active.address_line2 = Set(profile.address_line2);
        active.address_city = Set(profile.address_city);
        active.address_postal_code = Set(profile.address_postal_code);
        active.address_state = Set(profile.address_state);
        active.address_country = Set(profile.address_country);
        active.phone = Set(profile.phone);
        active.passport = Set(profile.passport);
        active.updated_at = Set(Utc::now().into());

        let customer = active.update(db).await?;
        tracing::info!(customer_id = %customer.id, "Customer updated");
        Ok(customer)
    }

    /// Applies a partial update to the customer `id`.
    pub async fn patch<C: ConnectionTrait>(
        &self,
        db: &C,
        id: Uuid,
        patch: CustomerPatch,
    ) -> AppResult<customer::Model> {
        let existing = find_by_id(db, id).await?;
        let user = users::find_by_id(db, existing.user_id).await?;
        let profile = patch.apply(CustomerProfile::from_model(&existing));
        self.update(db, existing, &user.email, &profile).await
    }
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<customer::Model> {
    customer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}

pub async fn find_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Option<customer::Model>> {
    let customer = customer::Entity::find()
        .filter(customer::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(customer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(country: &str, passport: Option<&str>) -> CustomerProfile {
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

    #[test]
    fn test_thai_residents_need_no_passport() {
        assert!(validate_passport(&profile("TH", None)).is_ok());
        assert!(validate_passport(&profile("th", Some(""))).is_ok());
    }

    #[test]
    fn test_foreign_nationals_need_passport() {
        assert_eq!(
            validate_passport(&profile("FR", None)),
            Err(ValidationError::PassportRequired)
        );
        assert_eq!(
            validate_passport(&profile("FR", Some("   "))),
            Err(ValidationError::PassportRequired)
        );
        assert!(validate_passport(&profile("FR", Some("12AB34567"))).is_ok());
    }

    #[test]
    fn test_normalized_blanks_become_none() {
        let mut raw = profile(" fr ", Some(""));
        raw.address_state = Some("  ".to_string());
        let normalized = raw.normalized();
        assert_eq!(normalized.address_country, "FR");
        assert_eq!(normalized.passport, None);
        assert_eq!(normalized.address_state, None);
    }

    #[test]
    fn test_patch_keeps_missing_fields() {
        let patch = CustomerPatch {
            phone: Some("+66 81 234 5678".to_string()),
            ..Default::default()
        };
        let patched = patch.apply(profile("TH", None));
        assert_eq!(patched.phone, "+66 81 234 5678");
        assert_eq!(patched.first_name, "Jane");
    }
}
