//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// No user id in the session or the event metadata
    #[error("payment target user not resolvable")]
    UserNotResolvable,

    /// Resolved user does not exist
    #[error("user not found")]
    UserNotFound,

    /// Checkout session exists but has not been paid
    #[error("checkout session not paid")]
    SessionNotPaid,

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Database error
    #[error("database error: {0}")]
    Db(#[from] fictioneer_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Whether the webhook caller should be told the request was malformed
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::WebhookError(_))
    }
}
