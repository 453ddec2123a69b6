use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use uuid::Uuid;

use crate::entities::user;
use crate::error::{AppError, AppResult, ValidationError};

/// Trims and lower-cases the domain part, leaving the local part untouched.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Accounts without a usable password never verify.
pub fn verify_password(user: &user::Model, password: &str) -> bool {
    let Some(hash) = user.password_hash.as_deref() else {
        return false;
    };

    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> AppResult<Option<user::Model>> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?;
    Ok(user)
}

/// Creates an account. Only staff and superusers may carry a password.
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: Option<&str>,
    is_staff: bool,
    is_superuser: bool,
) -> AppResult<user::Model> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ValidationError::EmailRequired.into());
    }

    let password_hash = match password.filter(|p| !p.is_empty()) {
        Some(_) if !(is_staff || is_superuser) => {
            return Err(ValidationError::PasswordNotAllowed.into());
        }
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let now = Utc::now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        is_staff: Set(is_staff),
        is_superuser: Set(is_superuser),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    new_user.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("Email {} is already registered", email))
        }
        _ => err.into(),
    })
}

pub async fn create_superuser<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> AppResult<user::Model> {
    create_user(db, email, Some(password), true, true).await
}

/// Returns the account for `email`, creating a password-less one when absent.
pub async fn get_or_create_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> AppResult<user::Model> {
    match find_by_email(db, email).await? {
        Some(user) => Ok(user),
        None => {
            let user = create_user(db, email, None, false, false).await?;
            tracing::info!(user_id = %user.id, "Customer account created");
            Ok(user)
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn list_users<C: ConnectionTrait>(db: &C) -> AppResult<Vec<user::Model>> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(users)
}

/// Deletes the account; its customer profile and bookings cascade.
pub async fn delete_user<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<()> {
    let result = user::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}
