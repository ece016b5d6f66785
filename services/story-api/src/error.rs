//! Error types for the Story API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fictioneer_billing::BillingError;
use fictioneer_core::CoreError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("You don't have enough credits. Please purchase more credits.")]
    InsufficientCredits,

    #[error("{0}")]
    StoryLimitReached(String),

    #[error("{0}")]
    PremiumRequired(String),

    #[error("You don't have permission to modify this story")]
    NotOwner,

    #[error("Story not found")]
    StoryNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payment has not been completed for this session")]
    PaymentNotVerified,

    #[error("Story generation failed. Please try again.")]
    GenerationFailed,

    #[error("Webhook error: {0}")]
    WebhookError(String),

    #[error("Internal error")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            Self::StoryLimitReached(_) | Self::PremiumRequired(_) | Self::NotOwner => {
                StatusCode::FORBIDDEN
            }
            Self::StoryNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::WebhookError(_) | Self::PaymentNotVerified => {
                StatusCode::BAD_REQUEST
            }
            Self::GenerationFailed => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InsufficientCredits => "INSUFFICIENT_CREDITS",
            Self::StoryLimitReached(_) => "STORY_LIMIT_REACHED",
            Self::PremiumRequired(_) => "PREMIUM_REQUIRED",
            Self::NotOwner => "FORBIDDEN",
            Self::StoryNotFound => "STORY_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::PaymentNotVerified => "PAYMENT_NOT_VERIFIED",
            Self::GenerationFailed => "GENERATION_FAILED",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if let Self::Internal(ref detail) = self {
            tracing::error!(detail = %detail, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UserNotFound => Self::UserNotFound,
            CoreError::StoryNotFound => Self::StoryNotFound,
            CoreError::NotOwner => Self::NotOwner,
            CoreError::InsufficientCredits => Self::InsufficientCredits,
            CoreError::StoryLimitReached { limit } => Self::StoryLimitReached(format!(
                "Free users can only create {limit} stories. Please upgrade to premium for unlimited stories."
            )),
            CoreError::VisibilityDenied(denied) => Self::PremiumRequired(denied.reason.to_string()),
            CoreError::InvalidSettings(e) => Self::BadRequest(e.to_string()),
            CoreError::Generation(cause) => {
                tracing::error!(error = %cause, "Generation collaborator failed");
                Self::GenerationFailed
            }
            CoreError::Db(e) => Self::Internal(e.to_string()),
            CoreError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::UserNotResolvable => {
                Self::BadRequest("Payment target user not resolvable".to_string())
            }
            BillingError::UserNotFound => Self::UserNotFound,
            BillingError::SessionNotPaid => Self::PaymentNotVerified,
            BillingError::WebhookError(e) => Self::WebhookError(e),
            BillingError::ProviderError(e) => {
                tracing::error!(error = %e, "Payment provider failed");
                Self::Internal(e)
            }
            BillingError::Db(e) => Self::Internal(e.to_string()),
            BillingError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<fictioneer_db::DbError> for ApiError {
    fn from(err: fictioneer_db::DbError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
