pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cars;
pub mod customers;
pub mod webhooks;

use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::entities::customer;
use crate::error::{AppError, AppResult};
use crate::services::customers as customer_service;
use crate::utils::jwt::Claims;

/// Loads the customer if the caller is staff or the customer's own user.
pub(crate) async fn authorize_customer<C: ConnectionTrait>(
    db: &C,
    claims: &Claims,
    customer_id: Uuid,
) -> AppResult<customer::Model> {
    let customer = customer_service::find_by_id(db, customer_id).await?;

    if !claims.is_staff && customer.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You do not have access to this customer".to_string(),
        ));
    }

    Ok(customer)
}
