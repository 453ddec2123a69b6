use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::entities::car_feature::CarFeatureKind;

pub type AppResult<T> = Result<T, AppError>;

/// Domain rule violations. Raised before any write and surfaced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The price of a booking cannot be negative")]
    NegativePrice,
    #[error("The start date of a booking cannot be in the past")]
    StartDateInPast,
    #[error("The end date of a booking cannot be in the past")]
    EndDateInPast,
    #[error("The end date of a booking must be after the start date")]
    EndBeforeStart,
    #[error("A booking cannot start on the same day")]
    SameDayBooking,
    #[error("This car is not available during this time period")]
    CarUnavailable,
    #[error("A passport number is required for foreign nationals")]
    PassportRequired,
    #[error("This booking is already canceled")]
    AlreadyCanceled,
    #[error("A completed booking cannot be canceled")]
    CancelCompleted,
    #[error("A canceled booking cannot be completed")]
    CompleteCanceled,
    #[error("This booking is already completed")]
    AlreadyCompleted,
    #[error("Cannot assign multiple thumbnails for one car")]
    MultipleThumbnails,
    #[error(
        "Invalid car feature name. Available options are: {}",
        CarFeatureKind::names().join(", ")
    )]
    InvalidFeature,
    #[error("Password is not allowed for regular users")]
    PasswordNotAllowed,
    #[error("Email is a required field")]
    EmailRequired,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NegativePrice => "NEGATIVE_PRICE",
            Self::StartDateInPast => "START_DATE_IN_PAST",
            Self::EndDateInPast => "END_DATE_IN_PAST",
            Self::EndBeforeStart => "END_BEFORE_START",
            Self::SameDayBooking => "SAME_DAY",
            Self::CarUnavailable => "CAR_UNAVAILABLE",
            Self::PassportRequired => "PASSPORT_REQUIRED",
            Self::AlreadyCanceled => "ALREADY_CANCELED",
            Self::CancelCompleted => "CANCEL_COMPLETED",
            Self::CompleteCanceled => "COMPLETE_CANCELED",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::MultipleThumbnails => "MULTIPLE_THUMBNAILS",
            Self::InvalidFeature => "INVALID_FEATURE",
            Self::PasswordNotAllowed => "PASSWORD_NOT_ALLOWED",
            Self::EmailRequired => "EMAIL_REQUIRED",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(err) => err.code(),
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL",
        }
    }

    /// The validation rule behind this error, if any.
    pub fn validation(&self) -> Option<ValidationError> {
        match self {
            AppError::Validation(err) => Some(*err),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            AppError::Upstream(_) => {
                tracing::error!(error = %self, "Upstream call failed");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
